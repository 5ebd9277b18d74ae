use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use citytemp::{
    chart::{ChartData, TemperatureChart, DEFAULT_WINDOW},
    client::{ApiClient, SaveOutcome, Transport},
    config::{ClientConfig, ConnectionArgs},
    export::write_csv,
    parse_temperature, summarize, telemetry, Record, Result,
};
use clap::{Parser, Subcommand};
use time::{format_description::well_known::Rfc3339, UtcOffset};

/// Command-line client for the city temperature records service
#[derive(Parser)]
#[command(name = "citytemp", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored records, most recently updated first
    List {
        /// Only cities whose name contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one record
    Show { id: u64 },

    /// Suggest stored cities matching a partial name
    Suggest { name: String },

    /// Fetch the current weather for a city and store it
    Fetch { city: String },

    /// Create or update a city's temperature
    Save {
        city: String,

        /// Degrees Celsius, e.g. `12.5` or `-3 °C`; omit for no reading
        temperature: Option<String>,
    },

    /// Change the temperature of a stored record
    Edit {
        id: u64,

        /// Degrees Celsius; omit to clear the reading
        temperature: Option<String>,
    },

    /// Delete a record
    Delete { id: u64 },

    /// Print count, average and extremes over all records
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Draw a bar chart of the most recently updated records
    Chart {
        #[arg(short, long, default_value = "temperatures.png")]
        output: PathBuf,

        /// Number of records to chart
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Image width in pixels
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = 720)]
        height: u32,
    },

    /// Export records as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the service's own export instead of building it locally
        #[arg(long)]
        remote: bool,
    },
}

fn temperature_label(temperature: Option<f64>) -> String {
    match temperature {
        Some(t) => format!("{t}°C"),
        None => String::from("N/A"),
    }
}

fn print_table(records: &[Record]) {
    if records.is_empty() {
        println!("No records found.");
        return;
    }
    println!("{:>5}  {:<24}  {:>10}  Updated", "ID", "City", "Temp");
    for record in records {
        let updated = record
            .updated_at
            .to_offset(UtcOffset::UTC)
            .format(&Rfc3339)
            .unwrap_or_default();
        println!(
            "{:>5}  {:<24}  {:>10}  {updated}",
            record.id,
            record.city_name,
            temperature_label(record.temperature)
        );
    }
}

fn run<T: Transport>(client: &ApiClient<T>, command: Command) -> Result<()> {
    match command {
        Command::List { search, json } => {
            let records = client.list(search.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_table(&records);
            }
        }
        Command::Show { id } => print_table(&[client.get(id)?]),
        Command::Suggest { name } => {
            let suggestions = client.suggest(&name)?;
            if suggestions.is_empty() {
                println!("No matching cities found");
            }
            for record in suggestions {
                println!("{record}");
            }
        }
        Command::Fetch { city } => {
            let fetched = client.fetch_weather(&city)?;
            let action = if fetched.created { "created" } else { "updated" };
            println!(
                "Fetched: {} - {} (record {} {action})",
                fetched.city_name,
                temperature_label(fetched.temperature),
                fetched.id
            );
            if !fetched.raw.description.is_empty() {
                println!("  {}", fetched.raw.description);
            }
            if let Some(humidity) = fetched.raw.humidity {
                println!("  humidity: {humidity}%");
            }
            if let Some(pressure) = fetched.raw.pressure {
                println!("  pressure: {pressure} hPa");
            }
        }
        Command::Save { city, temperature } => {
            let temperature = parse_temperature(temperature.as_deref().unwrap_or_default())?;
            let (verb, record) = match client.save(&city, temperature)? {
                SaveOutcome::Created(record) => ("Saved", record),
                SaveOutcome::Updated(record) => ("Updated", record),
            };
            println!(
                "{verb}: {} - {}",
                record.city_name,
                temperature_label(record.temperature)
            );
        }
        Command::Edit { id, temperature } => {
            let temperature = parse_temperature(temperature.as_deref().unwrap_or_default())?;
            let record = client.edit_temperature(id, temperature)?;
            println!("Record {id} updated: {record}");
        }
        Command::Delete { id } => {
            client.delete(id)?;
            println!("Record {id} deleted");
        }
        Command::Summary { json } => {
            let records = client.list(None)?;
            let summary = summarize(&records)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }
        Command::Chart {
            output,
            window,
            width,
            height,
        } => {
            let records = client.list(None)?;
            let mut chart = TemperatureChart::new(output).with_size(width, height);
            chart.replace(ChartData::from_records(&records, window))?;
            println!(
                "Wrote chart of {} records to {}",
                chart.data().bars.len(),
                chart.output().display()
            );
        }
        Command::Export { output, remote } => {
            let mut sink: Box<dyn io::Write> = match output {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(io::stdout().lock()),
            };
            if remote {
                sink.write_all(client.export_csv()?.as_bytes())?;
            } else {
                write_csv(&client.list(None)?, &mut sink)?;
            }
            sink.flush()?;
        }
    }
    Ok(())
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing()?;

    let config = ClientConfig::from(cli.connection);
    let client = ApiClient::from_config(&config);
    run(&client, cli.command)?;
    Ok(())
}

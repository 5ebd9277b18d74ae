use std::{
    fmt::Display,
    ops::Range,
    path::{Path, PathBuf},
};

use miette::Diagnostic;
use plotters::prelude::*;
use thiserror::Error;

use crate::record::Record;

/// How many of the most recently updated records are charted by default.
pub const DEFAULT_WINDOW: usize = 20;

const BAR_COLOR: RGBColor = RGBColor(102, 126, 234);

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub city_name: String,
    pub temperature: Option<f64>,
}

impl Bar {
    /// Missing readings are drawn flat.
    pub fn height(&self) -> f64 {
        self.temperature.unwrap_or(0.0)
    }
}

/// Bars in display order, oldest update on the left.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub bars: Vec<Bar>,
}

impl ChartData {
    pub fn from_records(records: &[Record], window: usize) -> Self {
        let mut recent: Vec<&Record> = records.iter().collect();
        recent.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));

        let mut bars: Vec<Bar> = recent
            .into_iter()
            .take(window)
            .map(|record| Bar {
                city_name: record.city_name.clone(),
                temperature: record.temperature,
            })
            .collect();
        bars.reverse();

        Self { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.bars.iter().map(|bar| bar.city_name.clone()).collect()
    }

    /// Y axis range, padded, always containing zero.
    pub fn value_range(&self) -> Range<f64> {
        let heights = self.bars.iter().map(Bar::height);
        let low = heights.clone().fold(0.0, f64::min);
        let high = heights.fold(0.0, f64::max);
        let pad = ((high - low) * 0.1).max(1.0);

        let low = if low < 0.0 { low - pad } else { low };
        low..high + pad
    }
}

#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum ChartError {
    #[error("No records to chart")]
    #[diagnostic(code(citytemp::chart::no_data))]
    NoData,
    #[error("Could not render chart: {0}")]
    #[diagnostic(code(citytemp::chart::render))]
    Render(String),
}

fn render_error(e: impl Display) -> ChartError {
    ChartError::Render(e.to_string())
}

/// A bar chart image that is redrawn whenever its data is replaced.
#[derive(Debug, Clone)]
pub struct TemperatureChart {
    output: PathBuf,
    size: (u32, u32),
    data: ChartData,
}

impl TemperatureChart {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            size: (1280, 720),
            data: ChartData::default(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    /// Swaps in new data and redraws the image.
    pub fn replace(&mut self, data: ChartData) -> Result<(), ChartError> {
        self.data = data;
        self.render()
    }

    pub fn render(&self) -> Result<(), ChartError> {
        if self.data.is_empty() {
            return Err(ChartError::NoData);
        }
        let labels = self.data.labels();
        let count = self.data.bars.len();

        let root = BitMapBackend::new(&self.output, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Temperature (°C)", ("sans-serif", 40).into_font())
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..count).into_segmented(), self.data.value_range())
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(count)
            .x_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(index) => labels.get(*index).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("Cities")
            .y_desc("Temperature (°C)")
            .draw()
            .map_err(render_error)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR_COLOR.mix(0.6).filled())
                    .margin(10)
                    .data(
                        self.data
                            .bars
                            .iter()
                            .enumerate()
                            .map(|(index, bar)| (index, bar.height())),
                    ),
            )
            .map_err(render_error)?
            .label("Temperature (°C)")
            .legend(|(x, y)| {
                Rectangle::new([(x, y - 5), (x + 20, y + 5)], BAR_COLOR.mix(0.6).filled())
            });

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;

        root.present().map_err(render_error)
    }
}

#[cfg(test)]
mod tests {
    use time::{macros::datetime, Duration};

    use super::*;

    fn records(temps: &[Option<f64>]) -> Vec<Record> {
        let base = datetime!(2024-05-01 00:00 UTC);
        temps
            .iter()
            .enumerate()
            .map(|(i, temperature)| Record {
                id: i as u64,
                city_name: format!("city-{i}"),
                temperature: *temperature,
                created_at: None,
                updated_at: base + Duration::hours(i as i64),
            })
            .collect()
    }

    #[test]
    fn keeps_the_most_recent_oldest_first() {
        let temps: Vec<_> = (0..25).map(|i| Some(i as f64)).collect();
        let data = ChartData::from_records(&records(&temps), DEFAULT_WINDOW);

        assert_eq!(data.bars.len(), 20);
        assert_eq!(data.bars.first().unwrap().city_name, "city-5");
        assert_eq!(data.bars.last().unwrap().city_name, "city-24");
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut shuffled = records(&[Some(1.0), Some(2.0), Some(3.0)]);
        shuffled.swap(0, 2);
        let data = ChartData::from_records(&shuffled, 2);

        assert_eq!(data.labels(), vec!["city-1", "city-2"]);
    }

    #[test]
    fn missing_readings_are_flat_bars() {
        let data = ChartData::from_records(&records(&[None, Some(4.0)]), DEFAULT_WINDOW);

        assert_eq!(data.bars[0].temperature, None);
        assert_eq!(data.bars[0].height(), 0.0);
        assert_eq!(data.bars[1].height(), 4.0);
    }

    #[test]
    fn range_contains_zero() {
        let warm = ChartData::from_records(&records(&[Some(10.0), Some(30.0)]), DEFAULT_WINDOW);
        let range = warm.value_range();
        assert_eq!(range.start, 0.0);
        assert_eq!(range.end, 33.0);

        let cold = ChartData::from_records(&records(&[Some(-20.0), Some(-5.0)]), DEFAULT_WINDOW);
        let range = cold.value_range();
        assert_eq!(range.start, -22.0);
        assert_eq!(range.end, 2.0);
    }

    #[test]
    fn rendering_nothing_is_an_error() {
        let mut chart = TemperatureChart::new("unused.png");
        assert_eq!(chart.render(), Err(ChartError::NoData));
        assert_eq!(chart.replace(ChartData::default()), Err(ChartError::NoData));
        assert!(!chart.output().exists());
    }
}

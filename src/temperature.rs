//! Parsing of temperatures typed by a user, like `12.5`, `-3 °C` or `12,5`.
//! Either side of the decimal separator may be empty (`12.`, `.5`), not both.
//! Blank input is a missing reading.

use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t]+")]
enum Token {
    #[regex(r"[+-]?([0-9]+([.,][0-9]*)?|[.,][0-9]+)")]
    Number,
    #[regex("[°º]?[cC]")]
    Celsius,
}

#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum TemperatureError {
    #[error("Bad temperature `{input}`: unexpected `{found}`")]
    #[diagnostic(
        code(citytemp::temperature::unexpected),
        help("expected a number in degrees Celsius, e.g. `12.5` or `-3 °C`")
    )]
    Unexpected { input: String, found: String },
    #[error("Bad temperature `{0}`: out of range")]
    #[diagnostic(code(citytemp::temperature::out_of_range))]
    OutOfRange(String),
}

pub fn parse_temperature(input: &str) -> Result<Option<f64>, TemperatureError> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    let mut lexer = Token::lexer(input);
    let unexpected = |found: &str| TemperatureError::Unexpected {
        input: input.to_string(),
        found: found.to_string(),
    };

    let value: f64 = match lexer.next() {
        Some(Ok(Token::Number)) => lexer
            .slice()
            .replace(',', ".")
            .parse()
            .map_err(|_| unexpected(lexer.slice()))?,
        _ => return Err(unexpected(lexer.slice())),
    };
    if !value.is_finite() {
        return Err(TemperatureError::OutOfRange(input.to_string()));
    }

    match lexer.next() {
        None => return Ok(Some(value)),
        Some(Ok(Token::Celsius)) => (),
        Some(_) => return Err(unexpected(lexer.slice())),
    }

    match lexer.next() {
        None => Ok(Some(value)),
        Some(_) => Err(unexpected(lexer.slice())),
    }
}

use std::{error, fmt, io::Error as IoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Bluez,
    Gatt,
    Advertisement,
    Io,
}

impl From<ErrorType> for &'static str {
    fn from(error_type: ErrorType) -> &'static str {
        match error_type {
            ErrorType::Bluez => "Bluez",
            ErrorType::Gatt => "GATT",
            ErrorType::Advertisement => "Advertisement",
            ErrorType::Io => "IO",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        let error_type: &str = (*self).into();
        write!(f, "<htsd {} Error>", error_type)
    }
}

impl error::Error for ErrorType {}

#[derive(Debug, Clone)]
pub struct Error {
    name: String,
    description: String,
    error_type: ErrorType,
}

impl Error {
    pub fn new<N: Into<String>, D: Into<String>>(
        name: N,
        description: D,
        error_type: ErrorType,
    ) -> Self {
        Error {
            name: name.into(),
            description: description.into(),
            error_type,
        }
    }

    pub fn name(self: &Self) -> &str {
        &self.name
    }

    pub fn description(self: &Self) -> &str {
        &self.description
    }

    pub fn error_type(self: &Self) -> ErrorType {
        self.error_type
    }
}

impl fmt::Display for Error {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        let error_type: &str = self.error_type.into();
        write!(f, "{} error {}: {}", error_type, self.name, self.description)
    }
}

impl error::Error for Error {
    fn source(self: &Self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.error_type)
    }
}

impl From<IoError> for Error {
    fn from(io_error: IoError) -> Error {
        Error::new(
            format!("std::io::Error: {:?}", io_error.kind()),
            format!("{}", io_error),
            ErrorType::Io,
        )
    }
}

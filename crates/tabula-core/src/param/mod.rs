//! Parameter binding.
//!
//! A [`BindRequest`] carries either pre-bound parameters (attached as-is)
//! or raw values (named from the placeholder tokens of the command text,
//! which is rewritten to the dialect's markers). Mixing the two is a
//! configuration error and binds nothing.

mod dialect;
mod scan;


pub use dialect::Dialect;

use crate::{
    cancel::{CancellationToken, checkpoint},
    config::ParameterConfig,
    error::{Error, ErrorOrigin},
    value::Value,
};

///
/// ParameterDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

///
/// BoundParameter
///
/// A named parameter ready to attach to a command.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: Value,
    pub direction: ParameterDirection,
}

impl BoundParameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            direction: ParameterDirection::Input,
        }
    }

    #[must_use]
    pub const fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }
}

///
/// Parameter
///
/// One element of a bind request: already bound, or a raw value to be
/// named from the command text.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Parameter {
    Bound(BoundParameter),
    Raw(Value),
}

impl From<BoundParameter> for Parameter {
    fn from(param: BoundParameter) -> Self {
        Self::Bound(param)
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

///
/// ExecuteOptions
///
/// Execution flags carried through to the produced command. Only the
/// cancellation token is acted on while binding.
///

#[derive(Clone, Debug, Default)]
pub struct ExecuteOptions {
    pub transaction: bool,
    pub return_identity: bool,
    pub cancellation: Option<CancellationToken>,
}

impl ExecuteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_transaction(mut self, enabled: bool) -> Self {
        self.transaction = enabled;
        self
    }

    #[must_use]
    pub const fn with_return_identity(mut self, enabled: bool) -> Self {
        self.return_identity = enabled;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

///
/// BindRequest
///

#[derive(Clone, Debug, Default)]
pub struct BindRequest {
    pub command_text: String,
    pub parameters: Vec<Parameter>,
    pub options: ExecuteOptions,
}

impl BindRequest {
    pub fn new(command_text: impl Into<String>) -> Self {
        Self {
            command_text: command_text.into(),
            ..Self::default()
        }
    }

    /// Append a raw value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.parameters.push(Parameter::Raw(value.into()));
        self
    }

    /// Append a pre-bound parameter.
    #[must_use]
    pub fn bound(mut self, param: BoundParameter) -> Self {
        self.parameters.push(Parameter::Bound(param));
        self
    }

    #[must_use]
    pub fn options(mut self, options: ExecuteOptions) -> Self {
        self.options = options;
        self
    }
}

///
/// Command
///
/// Bound command: rewritten text plus parameters in binding order.
///

#[derive(Clone, Debug, Default)]
pub struct Command {
    pub text: String,
    pub parameters: Vec<BoundParameter>,
    pub options: ExecuteOptions,
}

impl Command {
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.iter().find(|param| param.name == name)
    }
}

///
/// ParameterBuilder
///

#[derive(Clone, Debug)]
pub struct ParameterBuilder {
    placeholder: char,
    dialect: Dialect,
    positional_prefix: String,
}

impl ParameterBuilder {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_config(config: &ParameterConfig) -> Self {
        Self {
            placeholder: config.placeholder,
            dialect: config.dialect,
            positional_prefix: config.positional_prefix.clone(),
        }
    }

    #[must_use]
    pub const fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    #[must_use]
    pub fn with_positional_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.positional_prefix = prefix.into();
        self
    }

    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Produce a command from `request`.
    ///
    /// Placeholder tokens in the text name the raw values: `?` takes the
    /// next positional name, `?name` binds `name` (a marker directly
    /// followed by a word always reads as named). Repeated names share one
    /// value.
    pub fn bind(&self, request: BindRequest) -> Result<Command, Error> {
        let BindRequest {
            command_text,
            parameters,
            options,
        } = request;

        checkpoint(options.cancellation.as_ref(), ErrorOrigin::Parameter)?;

        let bound = parameters
            .iter()
            .filter(|param| matches!(param, Parameter::Bound(_)))
            .count();

        let (text, parameters) = if parameters.is_empty() {
            (command_text, Vec::new())
        } else if bound == parameters.len() {
            let parameters = parameters
                .into_iter()
                .filter_map(|param| match param {
                    Parameter::Bound(param) => Some(param),
                    Parameter::Raw(_) => None,
                })
                .collect();

            (command_text, parameters)
        } else if bound == 0 {
            let values = parameters
                .into_iter()
                .filter_map(|param| match param {
                    Parameter::Raw(value) => Some(value),
                    Parameter::Bound(_) => None,
                })
                .collect();

            self.bind_raw(&command_text, values, options.cancellation.as_ref())?
        } else {
            return Err(Error::configuration(
                ErrorOrigin::Parameter,
                format!(
                    "cannot mix {bound} pre-bound and {} raw parameters in one command",
                    parameters.len() - bound
                ),
            ));
        };

        tracing::debug!(
            dialect = %self.dialect,
            parameters = parameters.len(),
            "bound command parameters"
        );

        Ok(Command {
            text,
            parameters,
            options,
        })
    }

    fn bind_raw(
        &self,
        text: &str,
        values: Vec<Value>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<(String, Vec<BoundParameter>), Error> {
        let tokens = scan::scan(text, self.placeholder);

        if tokens.is_empty() {
            let parameters = values
                .into_iter()
                .enumerate()
                .map(|(index, value)| BoundParameter::new(self.positional_name(index), value))
                .collect();

            return Ok((text.to_string(), parameters));
        }

        // distinct names in first-appearance order; each token's name index
        let mut names: Vec<String> = Vec::new();
        let mut token_names = Vec::with_capacity(tokens.len());
        let mut positional = 0;
        for token in &tokens {
            let name = match &token.name {
                Some(name) => name.clone(),
                None => {
                    let name = self.positional_name(positional);
                    positional += 1;
                    name
                }
            };

            let index = names.iter().position(|known| *known == name).unwrap_or_else(|| {
                names.push(name);
                names.len() - 1
            });
            token_names.push(index);
        }

        if names.len() != values.len() {
            return Err(Error::configuration(
                ErrorOrigin::Parameter,
                format!(
                    "command expects {} parameter(s) but {} value(s) were supplied",
                    names.len(),
                    values.len()
                ),
            ));
        }

        let mut rewritten = String::with_capacity(text.len() + tokens.len() * 2);
        let mut cursor = 0;
        for (token, &index) in tokens.iter().zip(&token_names) {
            rewritten.push_str(&text[cursor..token.span.start]);
            rewritten.push_str(&self.dialect.marker(&names[index], index));
            cursor = token.span.end;
        }
        rewritten.push_str(&text[cursor..]);

        let mut parameters = Vec::with_capacity(values.len());
        for (name, value) in names.into_iter().zip(values) {
            checkpoint(cancellation, ErrorOrigin::Parameter)?;
            parameters.push(BoundParameter::new(name, value));
        }

        Ok((rewritten, parameters))
    }

    fn positional_name(&self, index: usize) -> String {
        format!("{}{index}", self.positional_prefix)
    }
}

impl Default for ParameterBuilder {
    fn default() -> Self {
        Self::from_config(&ParameterConfig::default())
    }
}

//! Processor pipelines described as data.
//!
//! A pipeline is written in the same grammar that [`Processor::identifier`]
//! prints: stages separated by `|>`, each one `name` or `name:key=value,...`.
//!
//! ```text
//! decode|>round-corner:radius=8,size=64x64
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bitmap::Size;
use crate::processor::{chain, DefaultProcessor, Processor, ProcessorExt, RoundCornerProcessor};

const STAGE_SEPARATOR: &str = "|>";

/// One stage of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProcessorSpec {
    Decode,
    RoundCorner {
        radius: f32,
        #[serde(default)]
        size: Option<Size>,
    },
}

impl ProcessorSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessorSpec::Decode => "decode",
            ProcessorSpec::RoundCorner { .. } => "round-corner",
        }
    }

    pub fn build(&self) -> Box<dyn Processor> {
        match *self {
            ProcessorSpec::Decode => DefaultProcessor.boxed(),
            ProcessorSpec::RoundCorner { radius, size } => {
                let processor = RoundCornerProcessor::new(radius);
                match size {
                    Some(size) => processor.with_target_size(size).boxed(),
                    None => processor.boxed(),
                }
            }
        }
    }
}

/// An ordered list of stages, run left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    stages: Vec<ProcessorSpec>,
}

impl Pipeline {
    pub fn new(stages: Vec<ProcessorSpec>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[ProcessorSpec] {
        &self.stages
    }

    /// Fold the stages into one processor. An empty pipeline just decodes.
    pub fn build(&self) -> Box<dyn Processor> {
        self.stages
            .iter()
            .map(ProcessorSpec::build)
            .reduce(|built, next| chain(built, next).boxed())
            .unwrap_or_else(|| DefaultProcessor.boxed())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(vec![ProcessorSpec::Decode])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Invalid processor pipeline: ")?;
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

fn parse_number(key: &str, value: &str) -> Result<f32, ParseError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ParseError(format!("`{key}` expects a number, got `{value}`")))
}

fn parse_size(value: &str) -> Result<Size, ParseError> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| ParseError(format!("`size` expects WIDTHxHEIGHT, got `{value}`")))?;
    Ok(Size::new(
        parse_number("size", width)?,
        parse_number("size", height)?,
    ))
}

impl TryFrom<&str> for ProcessorSpec {
    type Error = ParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name.trim(), Some(args)),
            None => (s.trim(), None),
        };
        let normalized = name.to_lowercase().replace([' ', '_'], "-");

        let args: Vec<(&str, &str)> = args
            .into_iter()
            .flat_map(|args| args.split(','))
            .map(|arg| {
                arg.split_once('=')
                    .map(|(key, value)| (key.trim(), value.trim()))
                    .ok_or_else(|| ParseError(format!("expected key=value, got `{arg}`")))
            })
            .collect::<Result<_, _>>()?;

        match normalized.as_str() {
            "decode" | "default" => match args.first() {
                Some((key, _)) => Err(ParseError(format!("`decode` takes no `{key}`"))),
                None => Ok(ProcessorSpec::Decode),
            },
            "round-corner" => {
                let mut radius = None;
                let mut size = None;
                for (key, value) in args {
                    match key {
                        "radius" => radius = Some(parse_number(key, value)?),
                        "size" => size = Some(parse_size(value)?),
                        _ => {
                            return Err(ParseError(format!("`round-corner` takes no `{key}`")))
                        }
                    }
                }
                let radius =
                    radius.ok_or_else(|| ParseError("`round-corner` needs a radius".into()))?;
                Ok(ProcessorSpec::RoundCorner { radius, size })
            }
            _ => Err(ParseError(format!("unknown stage `{name}`"))),
        }
    }
}

impl FromStr for ProcessorSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl FromStr for Pipeline {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseError("empty pipeline".into()));
        }

        let stages = s
            .split(STAGE_SEPARATOR)
            .map(ProcessorSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Parsed pipeline with {} stage(s)", stages.len());

        Ok(Pipeline::new(stages))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.build().identifier())
    }
}

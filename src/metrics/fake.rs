use std::collections::VecDeque;
use std::marker::PhantomData;

use super::MetricSource;
use crate::{Error, Result};

/// Always returns the same value.
#[derive(Debug, Clone)]
pub struct FixedSource<T: Clone>(pub T);

impl<T: Clone> MetricSource for FixedSource<T> {
    type Output = T;

    fn sample(&mut self) -> Result<T> {
        Ok(self.0.clone())
    }
}

/// Always fails, like a missing thermal zone or a broken `/proc`.
pub struct FailingSource<T> {
    reason: String,
    _output: PhantomData<fn() -> T>,
}

impl<T> FailingSource<T> {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            _output: PhantomData,
        }
    }
}

impl<T> MetricSource for FailingSource<T> {
    type Output = T;

    fn sample(&mut self) -> Result<T> {
        Err(Error::Metric(self.reason.clone()))
    }
}

/// Replays a scripted sequence of results, then keeps repeating the last value.
pub struct ScriptedSource<T: Clone> {
    script: VecDeque<Result<T>>,
    last: Option<T>,
}

impl<T: Clone> ScriptedSource<T> {
    pub fn new(script: Vec<Result<T>>) -> Self {
        Self {
            script: script.into(),
            last: None,
        }
    }
}

impl<T: Clone> MetricSource for ScriptedSource<T> {
    type Output = T;

    fn sample(&mut self) -> Result<T> {
        match self.script.pop_front() {
            Some(Ok(value)) => {
                self.last = Some(value.clone());
                Ok(value)
            }
            Some(Err(err)) => Err(err),
            None => self
                .last
                .clone()
                .ok_or_else(|| Error::Metric("script exhausted".into())),
        }
    }
}

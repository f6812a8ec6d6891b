#![allow(dead_code)]

use std::error::Error;

pub use watchflow_test_utils::{ExecutionLog, RegistryBuilder, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

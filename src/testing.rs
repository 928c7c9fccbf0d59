use crate::error::{Error, Result};
use std::fmt::Debug;

/// Fluent assertions over [`crate::Result`].
pub struct TestResult<T> {
    inner: Result<T>,
}

impl<T: Debug> TestResult<T> {
    pub fn new(result: Result<T>) -> Self {
        Self { inner: result }
    }

    /// Asserts success and returns the value.
    pub fn assert_success(self) -> T {
        match self.inner {
            Ok(val) => val,
            Err(e) => {
                panic!(
                    "\nTEST FAILED (Expected Success, but got Error):\nMessage: {}\nError:   {:?}\n",
                    e, e
                );
            }
        }
    }

    /// Asserts failure and returns the error.
    pub fn assert_failure(self) -> Error {
        match self.inner {
            Ok(val) => {
                panic!(
                    "\nTEST FAILED (Expected Failure, but got Success):\nValue: {:?}\n",
                    val
                );
            }
            Err(e) => e,
        }
    }

    /// Asserts failure with a message containing `expected_msg_part`.
    pub fn assert_failure_contains(self, expected_msg_part: &str) -> Error {
        let err = self.assert_failure();
        let actual_msg = err.to_string();
        if !actual_msg.contains(expected_msg_part) {
            panic!(
                "\nTEST FAILED (Error Message Mismatch):\nExpected part: {:?}\nActual msg:    {:?}\n",
                expected_msg_part, actual_msg
            );
        }
        err
    }
}

pub trait Testable<T> {
    fn test(self) -> TestResult<T>;
}

impl<T: Debug> Testable<T> for Result<T> {
    fn test(self) -> TestResult<T> {
        TestResult::new(self)
    }
}

/// Strips all whitespace, so generated code can be compared with a
/// hand-written expectation regardless of how tokens were spaced.
pub fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

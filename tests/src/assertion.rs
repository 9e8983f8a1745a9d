//! Fluent assertions on batch responses.
//!
//! ```ignore
//! expect(&response)
//!     .status(409)
//!     .error_type("IntegrityError.DuplicateEntry")
//!     .failed_at(1)
//!     .results(2);
//! ```

use opbatch_session::BatchResponse;
use serde_json::Value as Json;

/// Start asserting on a response.
pub fn expect(response: &BatchResponse) -> ResponseAssert<'_> {
    ResponseAssert { response }
}

/// Assertion builder. Every check panics with the full body on failure.
pub struct ResponseAssert<'r> {
    response: &'r BatchResponse,
}

impl<'r> ResponseAssert<'r> {
    fn body(&self) -> &Json {
        &self.response.body
    }

    fn fail(&self, what: String) -> ! {
        panic!(
            "{}\nstatus: {}\nbody: {}",
            what,
            self.response.status.as_u16(),
            serde_json::to_string_pretty(self.body()).unwrap_or_default()
        )
    }

    pub fn status(self, code: u16) -> Self {
        if self.response.status.as_u16() != code {
            self.fail(format!("expected status {}", code));
        }
        self
    }

    /// Status 200 with the commit message.
    pub fn committed(self) -> Self {
        let this = self.status(200);
        if this.body()["message"] != "Batch operations executed successfully." {
            this.fail("expected a committed batch".to_string());
        }
        this
    }

    pub fn error_type(self, ty: &str) -> Self {
        if self.body()["detail"]["type"] != ty {
            self.fail(format!("expected detail.type {}", ty));
        }
        self
    }

    pub fn error_message(self, message: &str) -> Self {
        if self.body()["error"] != message {
            self.fail(format!("expected error {:?}", message));
        }
        self
    }

    pub fn failed_at(self, index: usize) -> Self {
        if self.body()["detail"]["failed_operation_index"] != index {
            self.fail(format!("expected failed_operation_index {}", index));
        }
        self
    }

    pub fn detail(self, key: &str, expected: Json) -> Self {
        if self.body()["detail"][key] != expected {
            self.fail(format!("expected detail.{} = {}", key, expected));
        }
        self
    }

    /// Number of entries in `results`.
    pub fn results(self, count: usize) -> Self {
        let actual = self.body()["results"].as_array().map_or(0, Vec::len);
        if actual != count {
            self.fail(format!("expected {} results, got {}", count, actual));
        }
        self
    }

    /// Run a check against one result entry.
    pub fn result(self, position: usize, check: impl FnOnce(&Json)) -> Self {
        match self.body()["results"].get(position) {
            Some(entry) => check(entry),
            None => self.fail(format!("no result at position {}", position)),
        }
        self
    }

    /// The underlying results array.
    pub fn into_results(self) -> Vec<Json> {
        self.body()["results"].as_array().cloned().unwrap_or_default()
    }
}

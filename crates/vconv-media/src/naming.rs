//! Request-scoped virtual file names.
//!
//! Names are unique per request so concurrent requests against one engine
//! never share working-storage entries. They are also validated before they
//! reach the engine's storage: a name is a single path component.

use std::path::Path;

use uuid::Uuid;
use vconv_models::Operation;

use crate::catalog;
use crate::error::{EngineError, EngineResult};
use crate::packager::ResultPackager;

/// Longest source extension carried over to the input name.
const MAX_EXTENSION_LEN: usize = 8;

/// Input and output names for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFiles {
    request_id: String,
    input: String,
    output: String,
}

impl VirtualFiles {
    /// Fresh names for a request on `operation` whose source is called `source_name`.
    pub fn for_request(operation: Operation, source_name: &str) -> Self {
        Self::with_request_id(Uuid::new_v4().simple().to_string(), operation, source_name)
    }

    pub fn with_request_id(request_id: String, operation: Operation, source_name: &str) -> Self {
        let input_ext = source_extension(source_name)
            .unwrap_or_else(|| catalog::input_extension(operation).to_string());
        let output_ext = ResultPackager::output_format(operation).extension;

        Self {
            input: format!("{}-input.{}", request_id, input_ext),
            output: format!("{}-output.{}", request_id, output_ext),
            request_id,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Lowercased extension of `source_name` if it is short and alphanumeric.
fn source_extension(source_name: &str) -> Option<String> {
    let ext = Path::new(source_name).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// Validate that `name` is a plain file name usable inside working storage.
pub fn validate_virtual_name(name: &str) -> EngineResult<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(EngineError::InvalidFileName(name.to_string()));
    }

    // Null bytes and separators would let a name escape working storage
    if name.contains('\0') || name.contains('/') || name.contains('\\') {
        return Err(EngineError::InvalidFileName(name.to_string()));
    }

    Ok(())
}

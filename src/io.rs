//! One-shot JSON shell: read standard input exhaustively, write one result
//! document to standard output.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

/// Read standard input to the end and parse one problem instance.
pub fn read_instance<T: DeserializeOwned>() -> Result<T, Error> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write one pretty-printed JSON document plus a trailing newline.
///
/// Floats are printed at shortest round-trip precision, which preserves
/// every digit the solver produced.
pub fn write_result<T: Serialize>(result: &T) -> Result<(), Error> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, result)?;
    writeln!(handle)?;
    Ok(())
}

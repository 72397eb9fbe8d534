use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Loads the query text from inline text, a file, or stdin (`-`).
pub fn load_source(path: Option<&Path>, text: Option<&str>) -> Result<String, String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = path {
        if path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            return Ok(buf);
        }
        return fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()));
    }
    Err("no input: pass a file or use -s <TEXT>".to_string())
}

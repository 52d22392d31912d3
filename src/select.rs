//! Picking one asset out of a release.

use std::io::{BufRead, Write};

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;

use crate::error::{GrabError, Result};
use crate::release::Asset;

/// Choose an asset index, prompting on `input`/`output` only when there is
/// more than one candidate.
pub fn prompt<R: BufRead, W: Write>(assets: &[Asset], mut input: R, mut output: W) -> Result<usize> {
    match assets.len() {
        0 => Err(GrabError::NoAssets),
        1 => Ok(0),
        count => {
            writeln!(output, "Release Assets:").map_err(GrabError::Prompt)?;
            for (i, a) in assets.iter().enumerate() {
                writeln!(output, " ({}) {} ({})", i + 1, a.name, a.browser_download_url).map_err(GrabError::Prompt)?;
            }
            write!(output, "Which asset would you like to download? ").map_err(GrabError::Prompt)?;
            output.flush().map_err(GrabError::Prompt)?;

            let mut line = String::new();
            input.read_line(&mut line).map_err(GrabError::Prompt)?;
            writeln!(output).map_err(GrabError::Prompt)?;

            parse_choice(line.trim(), count)
        }
    }
}

/// [`prompt`] from inside async code. On a multi-threaded runtime the read is
/// moved off the worker with `block_in_place`; a current-thread runtime cannot
/// do that and reads in place.
pub fn prompt_blocking<R: BufRead, W: Write>(assets: &[Asset], input: R, output: W) -> Result<usize> {
    let read = || prompt(assets, input, output);
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => block_in_place(read),
        _ => read(),
    }
}

/// Turn a 1-based answer into a 0-based index.
fn parse_choice(answer: &str, count: usize) -> Result<usize> {
    let choice: usize = answer.parse().map_err(|_| GrabError::NoSelection)?;
    if choice == 0 || choice > count {
        return Err(GrabError::SelectionOutOfRange { choice, count });
    }
    Ok(choice - 1)
}

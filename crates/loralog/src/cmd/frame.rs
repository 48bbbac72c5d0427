use std::fs::File;
use std::io::Read;

use loralog_frame::{FrameError, FramerConfig, LineReader};

use crate::cmd::FrameArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_line, OutputFormat};

pub fn run(args: FrameArgs, format: OutputFormat) -> CliResult<i32> {
    let config = FramerConfig {
        max_buffer: args.max_buffer,
    };
    let source: Box<dyn Read> = match &args.file {
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        ),
        None => Box::new(std::io::stdin().lock()),
    };

    let count = frame_all(LineReader::with_config(source, config), |index, line| {
        print_line(index, line, format)
    })?;
    tracing::debug!(lines = count, "input framed");
    Ok(SUCCESS)
}

/// Drain `reader`, handing each line to `emit`. Returns the line count.
fn frame_all<R: Read>(
    mut reader: LineReader<R>,
    mut emit: impl FnMut(u64, &str),
) -> CliResult<u64> {
    let mut count = 0u64;
    loop {
        match reader.read_line() {
            Ok(Some(line)) => {
                emit(count, &line);
                count += 1;
            }
            Ok(None) => continue,
            Err(FrameError::ConnectionClosed) => return Ok(count),
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }
}

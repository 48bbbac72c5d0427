use std::sync::Arc;

use loralog_service::QueryService;
use loralog_store::SqliteStore;

use crate::cmd::MessagesArgs;
use crate::exit::{query_error, store_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_records, OutputFormat};

pub fn run(args: MessagesArgs, format: OutputFormat) -> CliResult<i32> {
    // Checked before opening, which would otherwise create an empty database.
    if args.limit <= 0 {
        return Err(CliError::new(
            USAGE,
            format!("--limit must be a positive integer (got {})", args.limit),
        ));
    }
    if !args.database.exists() {
        return Err(CliError::new(
            FAILURE,
            format!("database not found: {}", args.database.display()),
        ));
    }

    let store =
        SqliteStore::open(&args.database).map_err(|err| store_error("database open failed", err))?;
    let query = QueryService::new(Arc::new(store));
    let records = query
        .recent(args.limit)
        .map_err(|err| query_error("query failed", err))?;

    print_records(&records, format);
    Ok(SUCCESS)
}

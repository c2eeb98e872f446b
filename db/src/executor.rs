//! Script execution delegate.

use schema_history_core::SqlScript;
use tracing::debug;

use crate::connection::RawConnection;
use crate::error::{DatabaseError, Result};

/// Executes a parsed script against a raw connection.
///
/// The database runs initialization SQL through this trait so drivers and
/// tests can substitute their own execution strategy.
pub trait ScriptExecutor<C> {
    fn execute(&self, connection: &mut C, script: &SqlScript) -> Result<()>;
}

/// Runs statements in order and stops at the first failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScriptExecutor;

impl<C: RawConnection> ScriptExecutor<C> for DefaultScriptExecutor {
    fn execute(&self, connection: &mut C, script: &SqlScript) -> Result<()> {
        for statement in script.statements() {
            debug!(
                resource = script.resource_name(),
                line = statement.line,
                "executing statement"
            );
            connection.execute(&statement.sql).map_err(|source| {
                DatabaseError::ScriptExecutionFailure {
                    resource: script.resource_name().to_string(),
                    line: statement.line,
                    statement: statement.sql.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }
}

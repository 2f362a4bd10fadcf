use std::future::Future;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use serde_json::Value;
use tempo_client::{ClientError, ExecutionRef, WorkflowProvider, WorkflowSummary};
use tempo_history::RawEvent;
use tracing::{debug, warn};

use crate::config::TimeoutConfig;

/// Work that needs the provider. Each runs as its own task.
#[derive(Debug, Clone)]
pub enum AsyncCommand {
    ListWorkflows {
        generation: u64,
        query: String,
    },
    Describe {
        generation: u64,
        execution: ExecutionRef,
    },
    FetchHistory {
        generation: u64,
        execution: ExecutionRef,
    },
    Signal {
        execution: ExecutionRef,
        name: String,
        input: Option<Value>,
    },
    Cancel {
        execution: ExecutionRef,
        reason: String,
    },
    Terminate {
        execution: ExecutionRef,
        reason: String,
    },
    Delete {
        execution: ExecutionRef,
    },
    Reset {
        execution: ExecutionRef,
        event_id: i64,
        reason: String,
    },
    Query {
        execution: ExecutionRef,
        query_type: String,
        args: Option<Value>,
    },
}

/// Mutating commands, for messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Signal,
    Cancel,
    Terminate,
    Delete,
    Reset,
}

impl Mutation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Signal => "Signal",
            Self::Cancel => "Cancel",
            Self::Terminate => "Terminate",
            Self::Delete => "Delete",
            Self::Reset => "Reset",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Signal => "Signal sent",
            Self::Cancel => "Cancellation requested",
            Self::Terminate => "Workflow terminated",
            Self::Delete => "Workflow deleted",
            Self::Reset => "Workflow reset",
        }
    }
}

/// Sent back to the render loop.
#[derive(Debug)]
pub enum CommandResult {
    Workflows {
        generation: u64,
        result: Result<Vec<WorkflowSummary>, String>,
    },
    Described {
        generation: u64,
        result: Result<WorkflowSummary, String>,
    },
    History {
        generation: u64,
        result: Result<Vec<RawEvent>, String>,
    },
    /// `Ok(Some(run_id))` for a reset.
    Mutated {
        mutation: Mutation,
        execution: ExecutionRef,
        result: Result<Option<String>, String>,
    },
    Queried {
        query_type: String,
        result: Result<String, String>,
    },
}

/// Shared by every task spawned from one session.
#[derive(Clone)]
pub struct CommandContext {
    pub provider: Arc<dyn WorkflowProvider>,
    pub namespace: String,
    pub timeouts: TimeoutConfig,
}

async fn bounded<T>(limit: Duration, fut: impl Future<Output = tempo_client::Result<T>>) -> Result<T, String> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(describe_error(&e)),
        Err(_) => Err(ClientError::Timeout.to_string()),
    }
}

fn describe_error(e: &ClientError) -> String {
    if e.is_fetch_failure() {
        warn!("provider call failed: {e}");
    }
    e.to_string()
}

/// Runs `cmd` on `rt` and reports through `tx`. A closed channel means the
/// UI has exited, so the result is dropped.
pub fn spawn(rt: &tokio::runtime::Handle, ctx: CommandContext, cmd: AsyncCommand, tx: Sender<CommandResult>) {
    rt.spawn(async move {
        let result = execute(&ctx, cmd).await;
        if tx.send(result).is_err() {
            debug!("command finished after the UI closed");
        }
    });
}

pub async fn execute(ctx: &CommandContext, cmd: AsyncCommand) -> CommandResult {
    let provider = ctx.provider.as_ref();
    let ns = ctx.namespace.as_str();
    let meta = ctx.timeouts.metadata();
    match cmd {
        AsyncCommand::ListWorkflows { generation, query } => CommandResult::Workflows {
            generation,
            result: bounded(meta, provider.list_workflows(ns, &query)).await,
        },
        AsyncCommand::Describe {
            generation,
            execution,
        } => CommandResult::Described {
            generation,
            result: bounded(meta, provider.describe_workflow(ns, &execution)).await,
        },
        AsyncCommand::FetchHistory {
            generation,
            execution,
        } => CommandResult::History {
            generation,
            result: bounded(ctx.timeouts.history(), provider.fetch_history(ns, &execution)).await,
        },
        AsyncCommand::Signal {
            execution,
            name,
            input,
        } => {
            let result = bounded(meta, provider.signal(ns, &execution, &name, input)).await;
            CommandResult::Mutated {
                mutation: Mutation::Signal,
                execution,
                result: result.map(|()| None),
            }
        }
        AsyncCommand::Cancel { execution, reason } => {
            let result = bounded(meta, provider.cancel(ns, &execution, &reason)).await;
            CommandResult::Mutated {
                mutation: Mutation::Cancel,
                execution,
                result: result.map(|()| None),
            }
        }
        AsyncCommand::Terminate { execution, reason } => {
            let result = bounded(meta, provider.terminate(ns, &execution, &reason)).await;
            CommandResult::Mutated {
                mutation: Mutation::Terminate,
                execution,
                result: result.map(|()| None),
            }
        }
        AsyncCommand::Delete { execution } => {
            let result = bounded(meta, provider.delete(ns, &execution)).await;
            CommandResult::Mutated {
                mutation: Mutation::Delete,
                execution,
                result: result.map(|()| None),
            }
        }
        AsyncCommand::Reset {
            execution,
            event_id,
            reason,
        } => {
            let result = bounded(meta, provider.reset(ns, &execution, event_id, &reason)).await;
            CommandResult::Mutated {
                mutation: Mutation::Reset,
                execution,
                result: result.map(Some),
            }
        }
        AsyncCommand::Query {
            execution,
            query_type,
            args,
        } => {
            let result = bounded(
                ctx.timeouts.query(),
                provider.query(ns, &execution, &query_type, args),
            )
            .await;
            CommandResult::Queried { query_type, result }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_client::MockProvider;

    fn ctx() -> CommandContext {
        CommandContext {
            provider: Arc::new(MockProvider::new()),
            namespace: "default".into(),
            timeouts: TimeoutConfig::default(),
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn history_result_carries_generation() {
        let rt = runtime();
        let cmd = AsyncCommand::FetchHistory {
            generation: 7,
            execution: ExecutionRef::latest("payment-xyz789"),
        };
        match rt.block_on(execute(&ctx(), cmd)) {
            CommandResult::History { generation, result } => {
                assert_eq!(generation, 7);
                assert!(!result.unwrap().is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn spawned_commands_report_through_channel() {
        let rt = runtime();
        let (tx, rx) = std::sync::mpsc::channel();
        let cmd = AsyncCommand::Query {
            execution: ExecutionRef::latest("order-processing-abc123"),
            query_type: "bogus".into(),
            args: None,
        };
        spawn(rt.handle(), ctx(), cmd, tx);
        let result = rt.block_on(async {
            loop {
                if let Ok(result) = rx.try_recv() {
                    break result;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        assert!(matches!(
            result,
            CommandResult::Queried { result: Err(_), .. }
        ));
    }

    #[test]
    fn delete_reports_as_mutation() {
        let rt = runtime();
        let cmd = AsyncCommand::Delete {
            execution: ExecutionRef::latest("payment-xyz789"),
        };
        match rt.block_on(execute(&ctx(), cmd)) {
            CommandResult::Mutated {
                mutation, result, ..
            } => {
                assert_eq!(mutation, Mutation::Delete);
                assert_eq!(result, Ok(None));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn slow_calls_time_out() {
        let rt = runtime();
        let result: Result<(), String> = rt.block_on(bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }));
        assert_eq!(result.unwrap_err(), ClientError::Timeout.to_string());
    }
}

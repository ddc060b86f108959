//! Single-consumer request queue.
//!
//! [`spawn_node`] moves a [`Node`] onto a tokio task that owns it
//! exclusively. Callers talk to it through cloneable [`NodeHandle`]s;
//! commands are processed one at a time in arrival order and answered over
//! oneshot channels. The task ends, returning the node, once every handle
//! has been dropped.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vigil_ledger::{LedgerSnapshot, LedgerSummary};
use vigil_types::{AccountId, Amount};

use crate::error::NodeError;
use crate::node::Node;
use crate::request::{ProcessOutcome, Request};

type Reply<T> = oneshot::Sender<Result<T, NodeError>>;

enum Command {
    Process {
        request: Request,
        reply: Reply<ProcessOutcome>,
    },
    OpenAccount {
        username: String,
        reply: Reply<AccountId>,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
        reply: Reply<ProcessOutcome>,
    },
    RegisterDelegate {
        account: AccountId,
        share_percent: f64,
        reply: Reply<ProcessOutcome>,
    },
    Elect {
        account: AccountId,
        tokens: Vec<String>,
        reply: Reply<Vec<ProcessOutcome>>,
    },
    Summary {
        reply: oneshot::Sender<LedgerSummary>,
    },
    Snapshot {
        reply: oneshot::Sender<LedgerSnapshot>,
    },
}

/// Cloneable sender side of the node's request queue.
#[derive(Clone, Debug)]
pub struct NodeHandle {
    tx: mpsc::Sender<Command>,
}

/// Move `node` onto its own task, fed by a queue holding up to `capacity`
/// pending commands.
pub fn spawn_node(node: Node, capacity: usize) -> (NodeHandle, JoinHandle<Node>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(node, rx));
    (NodeHandle { tx }, task)
}

async fn run(mut node: Node, mut rx: mpsc::Receiver<Command>) -> Node {
    info!("request queue started");
    while let Some(command) = rx.recv().await {
        // A caller that stopped waiting is not an error for the node.
        let delivered = match command {
            Command::Process { request, reply } => reply.send(node.process(request)).is_ok(),
            Command::OpenAccount { username, reply } => {
                reply.send(node.open_account(&username)).is_ok()
            }
            Command::Transfer {
                from,
                to,
                amount,
                reply,
            } => reply.send(node.transfer(from, to, amount)).is_ok(),
            Command::RegisterDelegate {
                account,
                share_percent,
                reply,
            } => reply
                .send(node.register_delegate(account, share_percent))
                .is_ok(),
            Command::Elect {
                account,
                tokens,
                reply,
            } => reply.send(node.elect(account, &tokens)).is_ok(),
            Command::Summary { reply } => reply.send(node.summary()).is_ok(),
            Command::Snapshot { reply } => reply.send(node.snapshot()).is_ok(),
        };
        if !delivered {
            debug!("caller dropped before the reply was sent");
        }
    }
    info!("request queue closed");
    node
}

impl NodeHandle {
    async fn call<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| NodeError::QueueClosed)?;
        rx.await.map_err(|_| NodeError::QueueClosed)?
    }

    pub async fn process(&self, request: Request) -> Result<ProcessOutcome, NodeError> {
        self.call(|reply| Command::Process { request, reply }).await
    }

    pub async fn open_account(&self, username: &str) -> Result<AccountId, NodeError> {
        let username = username.to_string();
        self.call(|reply| Command::OpenAccount { username, reply })
            .await
    }

    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<ProcessOutcome, NodeError> {
        self.call(|reply| Command::Transfer {
            from,
            to,
            amount,
            reply,
        })
        .await
    }

    pub async fn register_delegate(
        &self,
        account: AccountId,
        share_percent: f64,
    ) -> Result<ProcessOutcome, NodeError> {
        self.call(|reply| Command::RegisterDelegate {
            account,
            share_percent,
            reply,
        })
        .await
    }

    pub async fn elect(
        &self,
        account: AccountId,
        tokens: Vec<String>,
    ) -> Result<Vec<ProcessOutcome>, NodeError> {
        self.call(|reply| Command::Elect {
            account,
            tokens,
            reply,
        })
        .await
    }

    pub async fn summary(&self) -> Result<LedgerSummary, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Summary { reply })
            .await
            .map_err(|_| NodeError::QueueClosed)?;
        rx.await.map_err(|_| NodeError::QueueClosed)
    }

    pub async fn snapshot(&self) -> Result<LedgerSnapshot, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| NodeError::QueueClosed)?;
        rx.await.map_err(|_| NodeError::QueueClosed)
    }
}

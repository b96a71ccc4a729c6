//! Benchmark core: timed calls, sessions, baseline checks, fixtures and the
//! workload lifecycle that ties them together.
mod cleanup;
mod invoker;
mod orchestrator;
mod precheck;
mod provision;
mod record;
mod session;

pub use invoker::TimedInvoker;
pub(crate) use orchestrator::join_ids;
pub use orchestrator::{LifecycleState, WorkloadOrchestrator};
pub use precheck::PreconditionChecker;
pub use provision::{Provisioner, RpcProvisioner};
pub use record::{ActionRecord, OrgId, Repeats, RunResult};
pub use session::{Credentials, Session, SessionToken};

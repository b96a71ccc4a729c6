use crate::args::Action;
use crate::runner::BenchTarget;

pub(in crate::entry) enum RunPlan {
    /// Serve one assignment read from stdin.
    Worker,
    Bench { target: BenchTarget, action: Action },
}

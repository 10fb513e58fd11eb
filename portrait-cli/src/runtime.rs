use anyhow::{Context, Result};
use std::future::Future;
use tokio::runtime::Handle;

/// Handle of the runtime started by `main`. Clients keep it so calls made
/// from plain worker threads (batch mode) still reach the same runtime.
pub fn current_handle() -> Result<Handle> {
    Handle::try_current().context("no tokio runtime running")
}

/// Drive `fut` to completion from synchronous code.
///
/// Inside a runtime thread a nested `block_on` would panic, so the
/// worker is first marked as blocking.
pub fn block_on<F: Future>(handle: &Handle, fut: F) -> F::Output {
    if Handle::try_current().is_ok() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        handle.block_on(fut)
    }
}

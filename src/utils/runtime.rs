//! Bridge from the synchronous pipeline to async libraries

use std::future::Future;

/// Run a future to completion on a fresh current-thread runtime
///
/// Must not be called from inside another tokio runtime.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

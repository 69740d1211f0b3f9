use anyhow::Result;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::collections::HashMap;

use super::ProcessOutput;
use super::ProcessRequest;
use super::ProcessRunner;
use crate::snapshot::Digest;

/// Memoizes successful process runs by the digest of their request.
pub struct CachingProcessRunner<TRunner: ProcessRunner> {
  inner: TRunner,
  entries: RefCell<HashMap<Digest, ProcessOutput>>,
}

impl<TRunner: ProcessRunner> CachingProcessRunner<TRunner> {
  pub fn new(inner: TRunner) -> Self {
    CachingProcessRunner {
      inner,
      entries: Default::default(),
    }
  }
}

impl<TRunner: ProcessRunner> ProcessRunner for CachingProcessRunner<TRunner> {
  fn run(&self, request: ProcessRequest) -> LocalBoxFuture<'_, Result<ProcessOutput>> {
    async move {
      let key = request.cache_key();
      if let Some(output) = self.entries.borrow().get(&key) {
        return Ok(output.clone());
      }
      let output = self.inner.run(request).await?;
      if output.exit_code == 0 {
        self.entries.borrow_mut().insert(key, output.clone());
      }
      Ok(output)
    }
    .boxed_local()
  }
}

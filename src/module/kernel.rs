use crate::module::{Module, ModuleContext, ModuleMeta};
use async_trait::async_trait;

/// Core module of the composition system.
///
/// No module needs to declare a dependency on it: it is always included in
/// the graph and always runs first.
#[derive(Default)]
pub struct KernelModule;

impl ModuleMeta for KernelModule {}

#[async_trait]
impl Module for KernelModule {
    async fn pre_initialize(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        // Make the active configuration resolvable like any other service.
        let config = ctx.config().clone();
        ctx.container().register_if_absent(|| config);

        tracing::debug!("kernel services registered");
        Ok(())
    }
}

//! Sequential driver for headless use: one request at a time, awaited in place.

use super::controller::{Dispatch, Resolution, SyncController};
use super::gateway::{RequestGateway, Transport};
use super::state::DocumentState;
use crate::Result;

pub struct SyncClient<T> {
    controller: SyncController,
    gateway: RequestGateway<T>,
}

impl<T: Transport> SyncClient<T> {
    pub fn new(gateway: RequestGateway<T>) -> Self {
        Self {
            controller: SyncController::new(),
            gateway,
        }
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    pub fn state(&self) -> &DocumentState {
        self.controller.state()
    }

    pub fn gateway(&self) -> &RequestGateway<T> {
        &self.gateway
    }

    pub async fn load(&mut self) -> Result<Resolution> {
        let dispatch = self.controller.on_mount();
        self.run(dispatch).await
    }

    /// Select `path` and upload it right away.
    pub async fn upload(&mut self, path: &str) -> Result<Resolution> {
        self.controller.on_file_selected(path)?;
        let dispatch = self.controller.on_upload_requested()?;
        self.run(dispatch).await
    }

    pub async fn submit(&mut self, text: &str) -> Result<Resolution> {
        let dispatch = self.controller.on_command_submitted(text)?;
        self.run(dispatch).await
    }

    pub async fn undo(&mut self) -> Result<Resolution> {
        let dispatch = self.controller.on_undo_requested();
        self.run(dispatch).await
    }

    pub async fn revert(&mut self, index: usize) -> Result<Resolution> {
        let dispatch = self.controller.on_revert_requested(index)?;
        self.run(dispatch).await
    }

    /// Revert at a newest-first history row.
    pub async fn revert_row(&mut self, display_pos: usize) -> Result<Resolution> {
        let dispatch = self.controller.on_revert_row_requested(display_pos)?;
        self.run(dispatch).await
    }

    async fn run(&mut self, dispatch: Dispatch) -> Result<Resolution> {
        match self.gateway.execute(&dispatch.request).await {
            Ok(snapshot) => Ok(self.controller.resolve(dispatch.seq, snapshot)),
            Err(e) => {
                self.controller.fail(dispatch.seq, &e.to_string());
                Err(e)
            }
        }
    }
}

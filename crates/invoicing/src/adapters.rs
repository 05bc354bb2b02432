//! Collaborator trait implementations for the HTTP clients.

use async_trait::async_trait;
use sheet_source::{SheetsClient, SheetsError};
use tracing::debug;
use zns_client::{TemplateMessage, ZnsClient, ZnsError};

use crate::dispatch::{DispatchError, DispatchOutcome, DispatchRequest, MessageDispatcher};
use crate::source::{SheetRange, SourceError, SpreadsheetSource};

impl From<SheetsError> for SourceError {
    fn from(err: SheetsError) -> Self {
        if err.is_auth() {
            SourceError::Auth(err.to_string())
        } else {
            SourceError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl SpreadsheetSource for SheetsClient {
    async fn fetch_rows(
        &self,
        source_id: &str,
        range: &SheetRange,
    ) -> Result<Vec<Vec<String>>, SourceError> {
        Ok(self.fetch_values(source_id, range).await?)
    }
}

#[async_trait]
impl MessageDispatcher for ZnsClient {
    async fn send(&self, request: &DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        let mut message = TemplateMessage::new(&request.phone, &request.template_id)
            .with_data(request.fields.clone());
        if let Some(tracking_id) = &request.tracking_id {
            message = message.with_tracking_id(tracking_id);
        }

        match self.send_template(&message).await {
            Ok(receipt) => {
                debug!(
                    phone = %request.phone,
                    msg_id = receipt.sent.msg_id.as_deref().unwrap_or(""),
                    "ZNS accepted message"
                );
                Ok(DispatchOutcome::sent(receipt.message))
            }
            Err(ZnsError::Api { code, message }) => {
                Ok(DispatchOutcome::failed(format!("{} ({})", message, code)))
            }
            Err(e @ ZnsError::Status { .. }) => Ok(DispatchOutcome::failed(e.to_string())),
            Err(e) => Err(DispatchError(e.to_string())),
        }
    }
}

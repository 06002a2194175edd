use shared::{
    domain::{Document, DocumentId},
    protocol::{CreateDocumentRequest, UpdateDocumentRequest},
    validation::{blank_updates, missing_fields},
};

use super::{fail, Actions};
use crate::{
    action_types::{Action, Deleted},
    error::ClientError,
    store::Dispatch,
};

impl Actions {
    pub async fn fetch_documents(
        &self,
        dispatch: &impl Dispatch,
    ) -> Result<Vec<Document>, ClientError> {
        dispatch.dispatch(Action::FetchDocumentsRequest);
        match self.api.list_documents().await {
            Ok(documents) => {
                dispatch.dispatch(Action::FetchDocumentsSuccessful(documents.clone()));
                Ok(documents)
            }
            Err(err) => fail(dispatch, Action::FetchDocumentsFailed, err),
        }
    }

    pub async fn get_document(
        &self,
        dispatch: &impl Dispatch,
        document_id: DocumentId,
    ) -> Result<Document, ClientError> {
        dispatch.dispatch(Action::DocumentGetRequest);
        match self.api.get_document(document_id).await {
            Ok(document) => {
                dispatch.dispatch(Action::DocumentGetSuccessful(document.clone()));
                Ok(document)
            }
            Err(err) => fail(dispatch, Action::DocumentGetFailed, err),
        }
    }

    pub async fn save_new_document(
        &self,
        dispatch: &impl Dispatch,
        document: CreateDocumentRequest,
    ) -> Result<Document, ClientError> {
        dispatch.dispatch(Action::DocumentCreateRequest);
        if let Some(message) = missing_fields([("title", document.title.as_deref())]) {
            return fail(
                dispatch,
                Action::DocumentCreateFailed,
                ClientError::Validation(message),
            );
        }
        match self.api.create_document(&document).await {
            Ok(created) => {
                dispatch.dispatch(Action::DocumentCreateSuccessful(created.clone()));
                Ok(created)
            }
            Err(err) => fail(dispatch, Action::DocumentCreateFailed, err),
        }
    }

    pub async fn modify_document(
        &self,
        dispatch: &impl Dispatch,
        document_id: DocumentId,
        changes: UpdateDocumentRequest,
    ) -> Result<Document, ClientError> {
        dispatch.dispatch(Action::DocumentModifyRequest);
        if let Some(message) = blank_updates([("title", changes.title.as_deref())]) {
            return fail(
                dispatch,
                Action::DocumentModifyFailed,
                ClientError::Validation(message),
            );
        }
        match self.api.update_document(document_id, &changes).await {
            Ok(document) => {
                dispatch.dispatch(Action::DocumentModifySuccessful(document.clone()));
                Ok(document)
            }
            Err(err) => fail(dispatch, Action::DocumentModifyFailed, err),
        }
    }

    pub async fn delete_document(
        &self,
        dispatch: &impl Dispatch,
        document_id: DocumentId,
    ) -> Result<String, ClientError> {
        dispatch.dispatch(Action::DocumentDeleteRequest);
        match self.api.delete_document(document_id).await {
            Ok(envelope) => {
                dispatch.dispatch(Action::DocumentDeleteSuccessful(Deleted {
                    id: document_id,
                    message: envelope.message.clone(),
                }));
                Ok(envelope.message)
            }
            Err(err) => fail(dispatch, Action::DocumentDeleteFailed, err),
        }
    }

    pub fn cancel_new_document(&self, dispatch: &impl Dispatch) {
        dispatch.dispatch(Action::DocumentCancelled);
    }
}

#[cfg(test)]
#[path = "tests/documents_tests.rs"]
mod tests;

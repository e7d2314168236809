/// Scripted in-memory gateway for store tests
use crate::{
    api::MediaApi,
    error::{ClientError, ClientResult},
    models::{
        AuthSession, CreateEntryFields, Entry, EntryPage, EntryQuery, LoginCredentials,
        Pagination, RegisterProfile, StatsSnapshot, UpdateEntryFields, User,
    },
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

/// A scripted list response, optionally held back behind a gate so
/// tests can reorder in-flight responses.
struct ScriptedList {
    result: ClientResult<EntryPage>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Gateway double: responses are queued per operation and consumed in
/// call order. An unscripted call fails loudly.
#[derive(Default)]
pub(crate) struct MockApi {
    login_results: Mutex<VecDeque<ClientResult<AuthSession>>>,
    register_results: Mutex<VecDeque<ClientResult<AuthSession>>>,
    self_results: Mutex<VecDeque<ClientResult<User>>>,
    logout_calls: AtomicUsize,
    list_scripts: Mutex<VecDeque<ScriptedList>>,
    default_page: Mutex<Option<EntryPage>>,
    get_results: Mutex<VecDeque<ClientResult<Entry>>>,
    create_results: Mutex<VecDeque<ClientResult<Entry>>>,
    update_results: Mutex<VecDeque<ClientResult<Entry>>>,
    delete_results: Mutex<VecDeque<ClientResult<()>>>,
    stats_results: Mutex<VecDeque<ClientResult<StatsSnapshot>>>,
    list_calls: Mutex<Vec<EntryQuery>>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn expect_login(&self, result: ClientResult<AuthSession>) {
        push(&self.login_results, result);
    }

    pub(crate) fn expect_register(&self, result: ClientResult<AuthSession>) {
        push(&self.register_results, result);
    }

    pub(crate) fn expect_self(&self, result: ClientResult<User>) {
        push(&self.self_results, result);
    }

    pub(crate) fn expect_list(&self, result: ClientResult<EntryPage>) {
        push(&self.list_scripts, ScriptedList { result, gate: None });
    }

    /// Queue a list response that is only released when the returned
    /// sender fires (or is dropped)
    pub(crate) fn expect_list_gated(&self, result: ClientResult<EntryPage>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        push(
            &self.list_scripts,
            ScriptedList {
                result,
                gate: Some(rx),
            },
        );
        tx
    }

    /// Fallback page returned whenever the list queue is empty
    pub(crate) fn set_default_page(&self, page: EntryPage) {
        *self.default_page.lock().unwrap_or_else(PoisonError::into_inner) = Some(page);
    }

    pub(crate) fn expect_get(&self, result: ClientResult<Entry>) {
        push(&self.get_results, result);
    }

    pub(crate) fn expect_create(&self, result: ClientResult<Entry>) {
        push(&self.create_results, result);
    }

    pub(crate) fn expect_update(&self, result: ClientResult<Entry>) {
        push(&self.update_results, result);
    }

    pub(crate) fn expect_delete(&self, result: ClientResult<()>) {
        push(&self.delete_results, result);
    }

    pub(crate) fn expect_stats(&self, result: ClientResult<StatsSnapshot>) {
        push(&self.stats_results, result);
    }

    /// Queries received by `list_entries`, in call order
    pub(crate) fn list_calls(&self) -> Vec<EntryQuery> {
        self.list_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

fn push<T>(queue: &Mutex<VecDeque<T>>, item: T) {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_back(item);
}

fn pop<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

fn missing<T>(operation: &str) -> ClientResult<T> {
    Err(ClientError::Internal(format!(
        "no scripted response for {}",
        operation
    )))
}

#[async_trait]
impl MediaApi for MockApi {
    async fn login(&self, _credentials: &LoginCredentials) -> ClientResult<AuthSession> {
        pop(&self.login_results).unwrap_or_else(|| missing("login"))
    }

    async fn register(&self, _profile: &RegisterProfile) -> ClientResult<AuthSession> {
        pop(&self.register_results).unwrap_or_else(|| missing("register"))
    }

    async fn fetch_self(&self) -> ClientResult<User> {
        pop(&self.self_results).unwrap_or_else(|| missing("fetch_self"))
    }

    async fn logout(&self) -> ClientResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_entries(&self, query: &EntryQuery) -> ClientResult<EntryPage> {
        self.list_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());

        let script = pop(&self.list_scripts);
        match script {
            Some(script) => {
                if let Some(gate) = script.gate {
                    // Held until the test releases (or drops) the gate
                    let _ = gate.await;
                }
                script.result
            }
            None => {
                let fallback = self
                    .default_page
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                fallback.map(Ok).unwrap_or_else(|| missing("list_entries"))
            }
        }
    }

    async fn get_entry(&self, _id: &str) -> ClientResult<Entry> {
        pop(&self.get_results).unwrap_or_else(|| missing("get_entry"))
    }

    async fn create_entry(&self, _fields: &CreateEntryFields) -> ClientResult<Entry> {
        pop(&self.create_results).unwrap_or_else(|| missing("create_entry"))
    }

    async fn update_entry(&self, _id: &str, _fields: &UpdateEntryFields) -> ClientResult<Entry> {
        pop(&self.update_results).unwrap_or_else(|| missing("update_entry"))
    }

    async fn delete_entry(&self, _id: &str) -> ClientResult<()> {
        pop(&self.delete_results).unwrap_or_else(|| missing("delete_entry"))
    }

    async fn get_statistics(&self) -> ClientResult<StatsSnapshot> {
        pop(&self.stats_results).unwrap_or_else(|| missing("get_statistics"))
    }
}

/// Build a page with a consistent pagination block
pub(crate) fn page_of(entries: Vec<Entry>, page: u32, limit: u32, total: u64) -> EntryPage {
    EntryPage {
        data: entries,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: 0,
        }
        .normalized(),
    }
}

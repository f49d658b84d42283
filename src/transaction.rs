use std::{cell::RefCell, marker::PhantomData, pin::Pin, rc::Rc};

use futures::{
    channel::oneshot,
    task::{Context, Poll},
    Future,
};

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{IdbTransaction, IdbTransactionMode};

use crate::{
    object_store::{ObjectStore, TransactionObjectStore},
    IndexedDb,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    Readonly,
    ReadWrite,
}

impl From<TransactionMode> for IdbTransactionMode {
    fn from(mode: TransactionMode) -> IdbTransactionMode {
        match mode {
            TransactionMode::Readonly => IdbTransactionMode::Readonly,
            TransactionMode::ReadWrite => IdbTransactionMode::Readwrite,
        }
    }
}

/// A transaction scoped to one object store.
///
/// Completion is watched from the moment the transaction is created, so awaiting [`done`] after
/// the last request has finished can't miss the `complete` event.
///
/// [`done`]: Transaction::done
#[derive(Debug)]
pub struct Transaction<'a> {
    pub(crate) inner: IdbTransaction,
    completion: TransactionFuture,
    pub(crate) db: PhantomData<&'a IndexedDb>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(inner: IdbTransaction) -> Self {
        let completion = TransactionFuture::new(inner.clone());
        Transaction {
            inner,
            completion,
            db: PhantomData,
        }
    }

    pub fn object_store(&self, name: &str) -> Result<TransactionObjectStore<'_>, JsValue> {
        let store = self.inner.object_store(name)?;

        Ok(TransactionObjectStore {
            inner: ObjectStore { inner: store },
            transaction: PhantomData,
        })
    }

    /// Wait for the transaction to commit.
    pub async fn done(self) -> Result<(), JsValue> {
        self.completion.await
    }

    /// Roll back everything done in this transaction.
    pub fn abort(self) -> Result<(), JsValue> {
        self.inner.abort()
    }
}

type Settle = Rc<RefCell<Option<oneshot::Sender<Result<(), JsValue>>>>>;

pub(crate) struct TransactionFuture {
    inner: IdbTransaction,
    receiver: oneshot::Receiver<Result<(), JsValue>>,
    _on_complete: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
    _on_abort: Closure<dyn FnMut()>,
}

impl TransactionFuture {
    fn new(transaction: IdbTransaction) -> Self {
        let (sender, receiver) = oneshot::channel();
        let sender: Settle = Rc::new(RefCell::new(Some(sender)));

        let on_complete = settle_on(&transaction, &sender, |_| Ok(()));
        let on_error = settle_on(&transaction, &sender, |tx| Err(transaction_error(tx)));
        let on_abort = settle_on(&transaction, &sender, |tx| Err(transaction_error(tx)));

        transaction.set_oncomplete(Some(on_complete.as_ref().unchecked_ref()));
        transaction.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        transaction.set_onabort(Some(on_abort.as_ref().unchecked_ref()));

        Self {
            inner: transaction,
            receiver,
            _on_complete: on_complete,
            _on_error: on_error,
            _on_abort: on_abort,
        }
    }
}

fn settle_on(
    transaction: &IdbTransaction,
    sender: &Settle,
    outcome: fn(&IdbTransaction) -> Result<(), JsValue>,
) -> Closure<dyn FnMut()> {
    let transaction = transaction.clone();
    let sender = sender.clone();

    Closure::wrap(Box::new(move || {
        if let Some(sender) = sender.borrow_mut().take() {
            let _ = sender.send(outcome(&transaction));
        }
    }) as Box<dyn FnMut()>)
}

fn transaction_error(transaction: &IdbTransaction) -> JsValue {
    transaction
        .error()
        .map(JsValue::from)
        .unwrap_or_else(|| JsValue::from_str("transaction aborted"))
}

impl Future for TransactionFuture {
    type Output = Result<(), JsValue>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => {
                Poll::Ready(Err(JsValue::from_str("transaction callbacks were removed")))
            }
        }
    }
}

impl Drop for TransactionFuture {
    fn drop(&mut self) {
        self.inner.set_oncomplete(None);
        self.inner.set_onerror(None);
        self.inner.set_onabort(None);
    }
}

impl std::fmt::Debug for TransactionFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "TransactionFuture")
    }
}

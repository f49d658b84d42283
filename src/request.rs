use futures::{
    channel::oneshot,
    task::{Context, Poll},
    Future,
};
use std::{cell::RefCell, fmt, pin::Pin, rc::Rc};

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{IdbRequest, IdbVersionChangeEvent};

use crate::db::{DbDuringUpgrade, IndexedDb};

type Outcome = Result<JsValue, JsValue>;
type Settle = Rc<RefCell<Option<oneshot::Sender<Outcome>>>>;

/// A single IndexedDB request as a future.
///
/// The success and error callbacks are installed as soon as the request is wrapped, and share one
/// sender: whichever fires first settles the future and the other becomes a no-op.
pub(crate) struct IndexedDbRequest {
    inner: IdbRequest,
    receiver: oneshot::Receiver<Outcome>,
    _onsuccess: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl IndexedDbRequest {
    pub(crate) fn new(request: IdbRequest) -> Self {
        let (sender, receiver) = oneshot::channel();
        let sender: Settle = Rc::new(RefCell::new(Some(sender)));

        let onsuccess = settle_on(&request, &sender, |req| req.result());
        let onerror = settle_on(&request, &sender, |req| Err(request_error(req)));

        request.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        request.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        Self {
            inner: request,
            receiver,
            _onsuccess: onsuccess,
            _onerror: onerror,
        }
    }
}

fn settle_on(
    request: &IdbRequest,
    sender: &Settle,
    outcome: fn(&IdbRequest) -> Outcome,
) -> Closure<dyn FnMut()> {
    let request = request.clone();
    let sender = sender.clone();

    Closure::wrap(Box::new(move || {
        if let Some(sender) = sender.borrow_mut().take() {
            let _ = sender.send(outcome(&request));
        }
    }) as Box<dyn FnMut()>)
}

fn request_error(request: &IdbRequest) -> JsValue {
    match request.error() {
        Ok(Some(e)) => e.into(),
        Ok(None) => JsValue::from_str("request failed without reporting an error"),
        Err(e) => e,
    }
}

impl Future for IndexedDbRequest {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // The sender lives in our own callbacks, so this only happens if they were replaced.
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(JsValue::from_str(
                "request callbacks were removed before the request settled",
            ))),
        }
    }
}

impl Drop for IndexedDbRequest {
    fn drop(&mut self) {
        // The closures are freed with us; stop the browser from calling into them.
        self.inner.set_onsuccess(None);
        self.inner.set_onerror(None);
    }
}

impl fmt::Debug for IndexedDbRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IndexedDbRequest")
    }
}

/// Wraps the open db request. Private - the user interacts with the request using the function
/// passed to the `open` method.
pub(crate) struct IdbOpenDbRequest {
    inner: web_sys::IdbOpenDbRequest,
    request: IndexedDbRequest,
    upgrade_error: Rc<RefCell<Option<JsValue>>>,
    _onupgradeneeded: Closure<dyn FnMut(IdbVersionChangeEvent)>,
    _onblocked: Closure<dyn FnMut(IdbVersionChangeEvent)>,
}

impl IdbOpenDbRequest {
    pub(crate) fn new<F>(request: web_sys::IdbOpenDbRequest, upgrade_callback: F) -> Self
    where
        F: FnOnce(u32, &DbDuringUpgrade) -> Result<(), JsValue> + 'static,
    {
        let upgrade_error = Rc::new(RefCell::new(None));

        let request_copy = request.clone();
        let error_slot = upgrade_error.clone();
        let mut upgrade_callback = Some(upgrade_callback);

        let onupgradeneeded = move |event: IdbVersionChangeEvent| {
            let old_version = event.old_version() as u32;

            let result = match request_copy.result() {
                Ok(r) => r,
                Err(e) => return abort_upgrade(&request_copy, &error_slot, e),
            };

            let db = DbDuringUpgrade::from_raw_unchecked(result);
            let callback = match upgrade_callback.take() {
                Some(callback) => callback,
                None => return,
            };

            if let Err(e) = callback(old_version, &db) {
                abort_upgrade(&request_copy, &error_slot, e);
            }
        };

        let onupgradeneeded =
            Closure::wrap(Box::new(onupgradeneeded) as Box<dyn FnMut(IdbVersionChangeEvent)>);
        request.set_onupgradeneeded(Some(onupgradeneeded.as_ref().unchecked_ref()));

        let onblocked = Closure::wrap(Box::new(move |event: IdbVersionChangeEvent| {
            console_web::println!(
                "opening the database at version {:?} is blocked by an open connection at version {}",
                event.new_version(),
                event.old_version()
            );
        }) as Box<dyn FnMut(IdbVersionChangeEvent)>);
        request.set_onblocked(Some(onblocked.as_ref().unchecked_ref()));

        let base: &IdbRequest = &request;
        let base = base.clone();

        IdbOpenDbRequest {
            inner: request,
            request: IndexedDbRequest::new(base),
            upgrade_error,
            _onupgradeneeded: onupgradeneeded,
            _onblocked: onblocked,
        }
    }
}

/// Abort the version change so the open request fails, and keep `error` to report in place of
/// the resulting AbortError.
fn abort_upgrade(
    request: &web_sys::IdbOpenDbRequest,
    error_slot: &RefCell<Option<JsValue>>,
    error: JsValue,
) {
    *error_slot.borrow_mut() = Some(error);
    if let Some(transaction) = request.transaction() {
        let _ = transaction.abort();
    }
}

impl Drop for IdbOpenDbRequest {
    fn drop(&mut self) {
        self.inner.set_onupgradeneeded(None);
        self.inner.set_onblocked(None);
    }
}

impl fmt::Debug for IdbOpenDbRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IdbOpenDbRequest")
    }
}

impl Future for IdbOpenDbRequest {
    type Output = Result<IndexedDb, JsValue>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        match Pin::new(&mut self.request).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(val)) => Poll::Ready(Ok(IndexedDb {
                inner: val.unchecked_into(),
            })),
            Poll::Ready(Err(e)) => {
                let e = self.upgrade_error.borrow_mut().take().unwrap_or(e);
                Poll::Ready(Err(e))
            }
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use wasm_bindgen::{closure::Closure, JsCast, JsValue};
    use wasm_bindgen_test::*;
    use web_sys::IdbVersionChangeEvent;

    use super::{abort_upgrade, IndexedDbRequest};
    use crate::delete_database;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn aborted_upgrade_fails_the_open() {
        delete_database("request-abort-upgrade").await.unwrap();

        let factory: web_sys::IdbFactory =
            js_sys::Reflect::get(&js_sys::global(), &"indexedDB".into())
                .unwrap()
                .unchecked_into();
        let request = factory.open_with_u32("request-abort-upgrade", 1).unwrap();

        let error_slot: Rc<RefCell<Option<JsValue>>> = Rc::new(RefCell::new(None));
        let request_copy = request.clone();
        let slot = error_slot.clone();
        let onupgradeneeded = Closure::wrap(Box::new(move |_: IdbVersionChangeEvent| {
            abort_upgrade(&request_copy, &slot, JsValue::from_str("no database handle"));
        }) as Box<dyn FnMut(IdbVersionChangeEvent)>);
        request.set_onupgradeneeded(Some(onupgradeneeded.as_ref().unchecked_ref()));

        let base: &web_sys::IdbRequest = &request;
        let outcome = IndexedDbRequest::new(base.clone()).await;

        let err: web_sys::DomException = outcome.unwrap_err().dyn_into().unwrap();
        assert_eq!(err.name(), "AbortError");
        assert_eq!(
            error_slot.borrow().as_ref().and_then(|e| e.as_string()),
            Some("no database handle".into())
        );
    }
}

//! Cart synchronizer.
//!
//! Keeps a local mirror of the remote cart. Mutations are applied to the
//! mirror optimistically, sent to the backend, then either reconciled with
//! the server's cart or rolled back to the snapshot taken just before the
//! optimistic write.
//!
//! # Ordering
//!
//! Every optimistic write first bumps a read generation. A fetch that started
//! under an older generation is abandoned (`AppError::Cancelled`) and never
//! writes, so a slow read cannot clobber a newer optimistic state. Mutations
//! themselves are never cancelled.
//!
//! [`CartSynchronizer::invalidate`] also starts a new session. A mutation
//! that was in flight across it neither rolls back nor reconciles, so a
//! logged-out cart never reappears in the mirror or the store.
//!
//! # Locking
//!
//! The mirror sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. Store writes happen under it so they stay ordered with
//! invalidation.

mod mirror;
mod store;
mod view;

pub use store::{CartStore, FileCartStore, MemoryCartStore, PersistedCart, StoreError};
pub use view::{CartLine, CartView};

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use phanto_core::{CartItemId, Money, ProductId, Quantity};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError, Cart, CartEnvelope, CartItem};
use crate::auth::{AuthEvent, AuthEvents};
use crate::error::{AppError, Result, ValidationError};

/// Kinds of cart mutation, for pending-state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Add,
    Update,
    Remove,
    Clear,
}

/// In-flight mutation counts per kind.
#[derive(Default)]
struct Pending {
    add: AtomicUsize,
    update: AtomicUsize,
    remove: AtomicUsize,
    clear: AtomicUsize,
}

impl Pending {
    const fn counter(&self, kind: MutationKind) -> &AtomicUsize {
        match kind {
            MutationKind::Add => &self.add,
            MutationKind::Update => &self.update,
            MutationKind::Remove => &self.remove,
            MutationKind::Clear => &self.clear,
        }
    }
}

/// Local mirror of the remote cart with optimistic mutations.
///
/// Cheap to clone; clones share one mirror.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    api: ApiClient,
    store: Arc<dyn CartStore>,
    mirror: Mutex<Option<Cart>>,
    /// Bumped before every optimistic write; in-flight reads watch it.
    reads: watch::Sender<u64>,
    /// Bumped by `invalidate`, under the mirror lock.
    session: AtomicU64,
    pending: Pending,
}

impl CartSynchronizer {
    /// Create a synchronizer with an empty mirror.
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn CartStore>) -> Self {
        let (reads, _) = watch::channel(0);
        Self {
            inner: Arc::new(SyncInner {
                api,
                store,
                mirror: Mutex::new(None),
                reads,
                session: AtomicU64::new(0),
                pending: Pending::default(),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch the cart and replace the mirror wholesale.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged (the mirror keeps its last good
    /// value), or `AppError::Cancelled` if a mutation started while the
    /// request was in flight.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Cart> {
        let mut reads = self.inner.reads.subscribe();
        let generation = *reads.borrow_and_update();

        let cart = tokio::select! {
            biased;
            _ = reads.changed() => {
                debug!("Cart read superseded before the reply arrived");
                return Err(AppError::Cancelled);
            }
            result = self.inner.api.get_cart() => result?,
        };

        {
            let mut mirror = self.lock();
            if *self.inner.reads.borrow() != generation {
                debug!("Cart read superseded while applying the reply");
                return Err(AppError::Cancelled);
            }
            *mirror = Some(cart.clone());
            self.persist(&cart);
        }

        debug!(items = cart.items.len(), total = %cart.total_price, "Cart fetched");
        Ok(cart)
    }

    /// Current mirror, if one has been loaded.
    #[must_use]
    pub fn snapshot(&self) -> Option<Cart> {
        self.lock().clone()
    }

    /// Display lines of the mirror.
    #[must_use]
    pub fn lines(&self) -> CartView {
        self.lock().as_ref().map(CartView::from).unwrap_or_default()
    }

    /// Units in the cart, derived from the display lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines().count()
    }

    /// Cart total, derived from the display lines.
    #[must_use]
    pub fn display_total(&self) -> Money {
        self.lines().total_price()
    }

    /// Whether a mutation of `kind` is in flight.
    #[must_use]
    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.inner.pending.counter(kind).load(Ordering::Acquire) > 0
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of a product.
    ///
    /// Not optimistic: the line is merged only once the backend confirms it,
    /// and only if a mirror is already loaded.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a quantity below one (nothing is sent),
    /// otherwise the transport error. The mirror is untouched on failure.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
    pub async fn add_item(&self, product_id: ProductId, quantity: i64) -> Result<CartItem> {
        let quantity = Quantity::new(quantity)?;
        let _pending = self.track(MutationKind::Add);

        let added = self.inner.api.add_cart_item(product_id, quantity).await?;

        {
            let mut mirror = self.lock();
            self.cancel_reads();
            match mirror.as_mut() {
                Some(cart) => {
                    mirror::merge_added(cart, &added);
                    self.persist(cart);
                }
                None => debug!("No cart loaded; added line will arrive with the next fetch"),
            }
        }

        info!(item_id = %added.item.id, total = %added.cart_total, "Item added to cart");
        Ok(added.item)
    }

    /// Change the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the quantity is below one or the item
    /// is not in the mirror (nothing is sent). On a backend failure the mirror
    /// is rolled back and the error returned.
    #[instrument(skip_all, fields(item_id = %item_id, quantity = quantity))]
    pub async fn update_item(&self, item_id: CartItemId, quantity: i64) -> Result<Cart> {
        let quantity = Quantity::new(quantity)?;
        self.require_item(item_id)?;

        self.mutate(
            MutationKind::Update,
            |cart| mirror::set_quantity(cart, item_id, quantity),
            self.inner.api.update_cart_item(item_id, quantity),
        )
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the item is not in the mirror (nothing
    /// is sent). On a backend failure the mirror is rolled back and the error
    /// returned.
    #[instrument(skip_all, fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<Cart> {
        self.require_item(item_id)?;

        self.mutate(
            MutationKind::Remove,
            |cart| mirror::remove_item(cart, item_id),
            self.inner.api.remove_cart_item(item_id),
        )
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// On a backend failure the mirror is rolled back and the error returned.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Cart> {
        self.mutate(
            MutationKind::Clear,
            mirror::clear,
            self.inner.api.clear_cart(),
        )
        .await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load the persisted mirror if nothing has been fetched yet.
    ///
    /// Returns whether a mirror was restored. Storage errors are logged and
    /// treated as "nothing stored".
    pub fn restore(&self) -> bool {
        let persisted = match self.inner.store.load() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted cart mirror");
                return false;
            }
        };

        let mut mirror = self.lock();
        if mirror.is_some() {
            return false;
        }
        debug!(
            cart_id = ?persisted.cart_id,
            saved_at = %persisted.saved_at,
            "Restored cart mirror"
        );
        *mirror = Some(persisted.cart);
        true
    }

    /// Drop the mirror and forget the stored copy.
    ///
    /// In-flight reads are abandoned. In-flight mutations still complete
    /// against the backend but leave the mirror and the store alone.
    pub fn invalidate(&self) {
        let mut mirror = self.lock();
        self.inner.session.fetch_add(1, Ordering::AcqRel);
        self.cancel_reads();
        *mirror = None;
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear persisted cart mirror");
        }
        drop(mirror);
        debug!("Cart mirror invalidated");
    }

    /// Follow auth state: drop the mirror on logout, refetch on login.
    ///
    /// Must be called from within a Tokio runtime. The task ends when every
    /// [`AuthEvents`] handle has been dropped.
    pub fn listen(&self, events: &AuthEvents) -> JoinHandle<()> {
        let mut rx = events.subscribe();
        let sync = self.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AuthEvent::LoggedOut) => sync.invalidate(),
                    Ok(AuthEvent::LoggedIn { user_id }) => {
                        if let Err(e) = sync.fetch().await {
                            warn!(user_id = %user_id, error = %e, "Cart fetch after login failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Cart synchronizer missed auth events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Optimistic write, request, then reconcile or roll back.
    async fn mutate<F, Fut>(&self, kind: MutationKind, optimistic: F, request: Fut) -> Result<Cart>
    where
        F: FnOnce(&mut Cart),
        Fut: Future<Output = std::result::Result<Option<CartEnvelope>, ApiError>>,
    {
        let _pending = self.track(kind);

        let (snapshot, session) = {
            let mut mirror = self.lock();
            self.cancel_reads();
            let snapshot = mirror.clone();
            let cart = mirror.get_or_insert_with(Cart::default);
            optimistic(cart);
            (snapshot, self.session())
        };

        match request.await {
            Ok(envelope) => Ok(self.reconcile(session, envelope.and_then(|e| e.cart))),
            Err(e) => {
                let mut mirror = self.lock();
                if self.session() == session {
                    warn!(mutation = ?kind, error = %e, "Cart mutation failed; rolling back");
                    *mirror = snapshot;
                } else {
                    warn!(mutation = ?kind, error = %e, "Cart mutation failed after invalidation");
                }
                Err(e.into())
            }
        }
    }

    /// Adopt the server's cart, or keep the optimistic state when the reply
    /// carried none. A reply from before the last invalidation is returned
    /// without touching the mirror.
    fn reconcile(&self, session: u64, server: Option<Cart>) -> Cart {
        let mut mirror = self.lock();
        if self.session() != session {
            debug!("Cart mirror invalidated while the mutation was in flight");
            return server.unwrap_or_default();
        }

        let cart = match server {
            Some(cart) => {
                *mirror = Some(cart.clone());
                cart
            }
            None => mirror.clone().unwrap_or_default(),
        };
        self.persist(&cart);
        cart
    }

    fn session(&self) -> u64 {
        self.inner.session.load(Ordering::Acquire)
    }

    fn require_item(&self, item_id: CartItemId) -> Result<()> {
        let known = self
            .lock()
            .as_ref()
            .is_some_and(|cart| cart.item(item_id).is_some());
        if known {
            Ok(())
        } else {
            Err(ValidationError::UnknownItem(item_id).into())
        }
    }

    fn cancel_reads(&self) {
        self.inner.reads.send_modify(|generation| *generation += 1);
    }

    /// Call with the mirror lock held.
    fn persist(&self, cart: &Cart) {
        if let Err(e) = self.inner.store.save(&PersistedCart::now(cart.clone())) {
            warn!(error = %e, "Failed to persist cart mirror");
        }
    }

    fn track(&self, kind: MutationKind) -> PendingGuard<'_> {
        let counter = self.inner.pending.counter(kind);
        counter.fetch_add(1, Ordering::AcqRel);
        PendingGuard(counter)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Cart>> {
        self.inner
            .mirror
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CartSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSynchronizer")
            .field("mirror", &*self.lock())
            .finish_non_exhaustive()
    }
}

/// Decrements a pending counter when the mutation finishes or is dropped.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

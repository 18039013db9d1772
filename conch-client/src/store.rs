//! Optimistic client store
//!
//! Single source of truth for UI surfaces. Collections sit behind a
//! read-write lock; every change bumps a revision and broadcasts a
//! [`StoreEvent`] so views can re-render.
//!
//! Mutations apply to the in-memory copy first. Each one is tagged with
//! a correlation id and recorded in a journal together with its inverse
//! operation. The server call runs after: success drops the journal
//! entry and reconciles with the authoritative response, failure
//! applies the inverse so exactly that mutation rolls back while
//! unrelated optimistic state stays put.
//!
//! Without a token the cart and favorites live purely locally and are
//! never dispatched. [`ClientStore::login`] switches the active source
//! to the server; the guest data is kept aside, not merged.
//!
//! Refreshes are not fenced: a refresh started before a mutation may
//! resolve after it and overwrite the collection. Callers that need
//! ordering await each call before issuing the next.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use shared::client::{LoginResponse, RegisterRequest};
use shared::models::{
    Address, AddressCreate, AddressUpdate, Cart, CartItem, CartItemAdd, Favorite, Order,
    OrderAddress, OrderCreate, OrderStatus, PaymentResult,
};

use crate::snapshot::{GuestSection, Snapshot, SnapshotStore};
use crate::{ClientConfig, ClientError, ClientResult, HttpClient};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const GUEST_USER: &str = "guest";

/// Store collections a view can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Cart,
    Favorites,
    Addresses,
    Orders,
}

/// Change notification broadcast to subscribers
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A collection changed; `revision` increases monotonically
    Changed {
        collection: Collection,
        revision: u64,
    },
    /// The server rejected the session; embedders should return to login
    SessionExpired,
}

#[derive(Debug, Default)]
struct Collections {
    cart: Option<Cart>,
    favorites: Vec<Favorite>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
}

/// Inverse of one optimistic mutation
#[derive(Debug)]
enum InverseOp {
    /// Nothing was applied locally; there is nothing to undo
    None,
    CartSetQuantity {
        product_id: String,
        quantity: i32,
    },
    CartRemoveLine {
        product_id: String,
    },
    CartInsertLine {
        item: CartItem,
    },
    CartRestoreItems {
        items: Vec<CartItem>,
    },
    FavoriteRemove {
        product_id: String,
    },
    FavoriteInsert {
        favorite: Favorite,
    },
    AddressRemove {
        id: String,
    },
    AddressPut {
        address: Address,
    },
    AddressInsert {
        address: Address,
    },
    AddressesRestore {
        addresses: Vec<Address>,
    },
    OrderRemove {
        id: String,
    },
    OrderSetStatus {
        order_id: String,
        status: OrderStatus,
    },
    OrderSetPayment {
        order_id: String,
        payment_result: Option<PaymentResult>,
    },
}

impl Collections {
    fn revert(&mut self, op: InverseOp) {
        match op {
            InverseOp::None => {}
            InverseOp::CartSetQuantity {
                product_id,
                quantity,
            } => {
                if let Some(cart) = self.cart.as_mut()
                    && let Some(line) = cart.items.iter_mut().find(|i| i.product_id == product_id)
                {
                    line.quantity = quantity;
                }
            }
            InverseOp::CartRemoveLine { product_id } => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.items.retain(|i| i.product_id != product_id);
                }
            }
            InverseOp::CartInsertLine { item } => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.items.push(item);
                }
            }
            InverseOp::CartRestoreItems { items } => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.items = items;
                }
            }
            InverseOp::FavoriteRemove { product_id } => {
                self.favorites.retain(|f| f.product != product_id);
            }
            InverseOp::FavoriteInsert { favorite } => {
                self.favorites.push(favorite);
            }
            InverseOp::AddressRemove { id } => {
                self.addresses.retain(|a| a.id.as_deref() != Some(id.as_str()));
            }
            InverseOp::AddressPut { address } => {
                if let Some(slot) = self.addresses.iter_mut().find(|a| a.id == address.id) {
                    *slot = address;
                }
            }
            InverseOp::AddressInsert { address } => {
                self.addresses.push(address);
            }
            InverseOp::AddressesRestore { addresses } => {
                self.addresses = addresses;
            }
            InverseOp::OrderRemove { id } => {
                self.orders.retain(|o| o.id.as_deref() != Some(id.as_str()));
            }
            InverseOp::OrderSetStatus { order_id, status } => {
                if let Some(order) = self
                    .orders
                    .iter_mut()
                    .find(|o| o.id.as_deref() == Some(order_id.as_str()))
                {
                    order.status = status;
                }
            }
            InverseOp::OrderSetPayment {
                order_id,
                payment_result,
            } => {
                if let Some(order) = self
                    .orders
                    .iter_mut()
                    .find(|o| o.id.as_deref() == Some(order_id.as_str()))
                {
                    order.payment_result = payment_result;
                }
            }
        }
    }

    fn address_mut(&mut self, id: &str) -> Option<&mut Address> {
        self.addresses
            .iter_mut()
            .find(|a| a.id.as_deref() == Some(id))
    }
}

#[derive(Debug)]
struct MutationEntry {
    id: Uuid,
    collection: Collection,
    inverse: InverseOp,
}

/// Optimistic store over the Store Server API
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct ClientStore {
    http: RwLock<HttpClient>,
    state: RwLock<Collections>,
    /// Guest cart/favorites kept aside while a session is active
    guest: RwLock<GuestSection>,
    journal: Mutex<Vec<MutationEntry>>,
    snapshots: SnapshotStore,
    revision: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

impl ClientStore {
    pub fn new(config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http: RwLock::new(HttpClient::new(&config)),
            state: RwLock::new(Collections::default()),
            guest: RwLock::new(GuestSection::default()),
            journal: Mutex::new(Vec::new()),
            snapshots: SnapshotStore::new(&config.cache_dir),
            revision: AtomicU64::new(0),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.read().token().is_some()
    }

    /// Current change revision
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Number of optimistic mutations still awaiting the server
    pub fn pending_mutations(&self) -> usize {
        self.journal.lock().len()
    }

    // ==================== Reads ====================

    pub fn cart(&self) -> Option<Cart> {
        self.state.read().cart.clone()
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        self.state.read().favorites.clone()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.state.read().addresses.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.read().orders.clone()
    }

    // ==================== Hydration and refresh ====================

    /// Install the last snapshot before any network call
    ///
    /// With a token the server-owned sections become the visible
    /// collections; without one only the guest section does, so a
    /// previous user's data never shows.
    pub fn hydrate(&self) {
        let authenticated = self.is_authenticated();
        let snapshot = self.snapshots.load();
        {
            let mut state = self.state.write();
            let mut guest = self.guest.write();
            if authenticated {
                state.cart = snapshot.cart;
                state.favorites = snapshot.favorites;
                state.addresses = snapshot.addresses;
                state.orders = snapshot.orders;
                *guest = snapshot.guest;
            } else {
                state.cart = snapshot.guest.cart.clone();
                state.favorites = snapshot.guest.favorites.clone();
                state.addresses.clear();
                state.orders.clear();
                *guest = GuestSection::default();
            }
        }
        self.notify_all();
    }

    /// Replace every collection with server truth and persist
    ///
    /// A no-op without a token. Transport failures leave the
    /// last-known-good collections in place.
    pub async fn refresh_all(&self) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        self.refresh_cart().await?;
        self.refresh_favorites().await?;
        self.refresh_addresses().await?;
        self.refresh_orders().await?;
        Ok(())
    }

    pub async fn refresh_cart(&self) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let http = self.http.read().clone();
        match http.cart().await {
            Ok(cart) => {
                self.state.write().cart = Some(cart);
                self.notify(Collection::Cart);
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.absorb_failure(err)),
        }
    }

    pub async fn refresh_favorites(&self) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let http = self.http.read().clone();
        match http.favorites().await {
            Ok(favorites) => {
                self.state.write().favorites = favorites;
                self.notify(Collection::Favorites);
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.absorb_failure(err)),
        }
    }

    pub async fn refresh_addresses(&self) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let http = self.http.read().clone();
        match http.addresses().await {
            Ok(addresses) => {
                self.state.write().addresses = addresses;
                self.notify(Collection::Addresses);
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.absorb_failure(err)),
        }
    }

    pub async fn refresh_orders(&self) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let http = self.http.read().clone();
        match http.my_orders().await {
            Ok(orders) => {
                self.state.write().orders = orders;
                self.notify(Collection::Orders);
                self.persist();
                Ok(())
            }
            Err(err) => Err(self.absorb_failure(err)),
        }
    }

    // ==================== Session ====================

    /// Login and switch the active source to the server
    ///
    /// Guest cart/favorites are stashed aside untouched; the account's
    /// own collections are fetched fresh.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let http = self.http.read().clone();
        let response = http.login(email, password).await?;
        self.adopt_session(&response.token);
        if let Err(err) = self.refresh_all().await {
            tracing::warn!(error = %err, "Initial refresh after login failed");
        }
        Ok(response)
    }

    /// Register a new account and adopt its session
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<LoginResponse> {
        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let http = self.http.read().clone();
        let response = http.register(&request).await?;
        self.adopt_session(&response.token);
        if let Err(err) = self.refresh_all().await {
            tracing::warn!(error = %err, "Initial refresh after registration failed");
        }
        Ok(response)
    }

    /// Drop the session locally and return to the guest data
    ///
    /// Sessions are stateless JWTs, so there is no server call.
    pub fn logout(&self) {
        self.reset_to_guest();
        self.notify_all();
    }

    fn adopt_session(&self, token: &str) {
        {
            let mut state = self.state.write();
            let mut guest = self.guest.write();
            guest.cart = state.cart.take();
            guest.favorites = std::mem::take(&mut state.favorites);
        }
        {
            let mut http = self.http.write();
            *http = http.clone().with_token(token);
        }
        self.notify(Collection::Cart);
        self.notify(Collection::Favorites);
    }

    /// Server refused the token: clear the session and surface it
    fn session_expired(&self) {
        tracing::warn!("Session rejected by server; clearing local session");
        self.reset_to_guest();
        let _ = self.events.send(StoreEvent::SessionExpired);
    }

    fn reset_to_guest(&self) {
        {
            let mut http = self.http.write();
            *http = http.clone().without_token();
        }
        let restored = {
            let mut guest = self.guest.write();
            (guest.cart.take(), std::mem::take(&mut guest.favorites))
        };
        {
            let mut state = self.state.write();
            state.cart = restored.0;
            state.favorites = restored.1;
            state.addresses.clear();
            state.orders.clear();
        }
        self.journal.lock().clear();
        self.persist();
    }

    // ==================== Cart ====================

    /// Add quantity of a product, visible immediately
    pub async fn add_to_cart(&self, req: CartItemAdd) -> ClientResult<()> {
        if req.quantity < 1 {
            return Err(ClientError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if !self.is_authenticated() {
            return self.guest_add_to_cart(req);
        }

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            let cart = state.cart.get_or_insert_with(empty_cart);
            match cart.items.iter_mut().find(|i| i.product_id == req.product_id) {
                Some(line) => {
                    let previous = line.quantity;
                    line.quantity += req.quantity;
                    InverseOp::CartSetQuantity {
                        product_id: req.product_id.clone(),
                        quantity: previous,
                    }
                }
                None => {
                    cart.items.push(cart_line_from_hints(&req));
                    InverseOp::CartRemoveLine {
                        product_id: req.product_id.clone(),
                    }
                }
            }
        };
        self.record(correlation, Collection::Cart, inverse);
        self.notify(Collection::Cart);

        let http = self.http.read().clone();
        match http.add_cart_item(&req).await {
            Ok(cart) => {
                self.confirm(correlation);
                self.install_cart(cart);
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    /// Overwrite one line's quantity
    pub async fn set_cart_quantity(&self, product_id: &str, quantity: i32) -> ClientResult<()> {
        if quantity < 1 {
            return Err(ClientError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if !self.is_authenticated() {
            return self.guest_set_cart_quantity(product_id, quantity);
        }

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state
                .cart
                .as_mut()
                .and_then(|c| c.items.iter_mut().find(|i| i.product_id == product_id))
            {
                Some(line) => {
                    let previous = line.quantity;
                    line.quantity = quantity;
                    InverseOp::CartSetQuantity {
                        product_id: product_id.to_string(),
                        quantity: previous,
                    }
                }
                // The line may exist server-side even if not cached
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Cart, inverse);
        self.notify(Collection::Cart);

        let http = self.http.read().clone();
        match http.set_cart_quantity(product_id, quantity).await {
            Ok(cart) => {
                self.confirm(correlation);
                self.install_cart(cart);
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    /// Remove one line; absent lines are ignored
    pub async fn remove_cart_item(&self, product_id: &str) -> ClientResult<()> {
        if !self.is_authenticated() {
            return self.guest_remove_cart_item(product_id);
        }

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state.cart.as_mut() {
                Some(cart) => {
                    match cart.items.iter().position(|i| i.product_id == product_id) {
                        Some(index) => {
                            let item = cart.items.remove(index);
                            InverseOp::CartInsertLine { item }
                        }
                        None => InverseOp::None,
                    }
                }
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Cart, inverse);
        self.notify(Collection::Cart);

        let http = self.http.read().clone();
        match http.remove_cart_item(product_id).await {
            Ok(cart) => {
                self.confirm(correlation);
                self.install_cart(cart);
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    /// Empty the cart; the record itself survives
    pub async fn clear_cart(&self) -> ClientResult<()> {
        if !self.is_authenticated() {
            return self.guest_clear_cart();
        }

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state.cart.as_mut() {
                Some(cart) => {
                    let items = std::mem::take(&mut cart.items);
                    InverseOp::CartRestoreItems { items }
                }
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Cart, inverse);
        self.notify(Collection::Cart);

        let http = self.http.read().clone();
        match http.clear_cart().await {
            Ok(cart) => {
                self.confirm(correlation);
                self.install_cart(cart);
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    // ==================== Favorites ====================

    pub async fn add_favorite(&self, product_id: &str) -> ClientResult<()> {
        if !self.is_authenticated() {
            return self.guest_add_favorite(product_id);
        }

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            if state.favorites.iter().any(|f| f.product == product_id) {
                // Already present locally; let the server report the conflict
                InverseOp::None
            } else {
                state.favorites.push(Favorite {
                    id: Some(pending_id(correlation)),
                    user: String::new(),
                    product: product_id.to_string(),
                    created_at: Some(Utc::now()),
                });
                InverseOp::FavoriteRemove {
                    product_id: product_id.to_string(),
                }
            }
        };
        self.record(correlation, Collection::Favorites, inverse);
        self.notify(Collection::Favorites);

        let http = self.http.read().clone();
        match http.add_favorite(product_id).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_favorites().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    pub async fn remove_favorite(&self, product_id: &str) -> ClientResult<()> {
        if !self.is_authenticated() {
            return self.guest_remove_favorite(product_id);
        }

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state.favorites.iter().position(|f| f.product == product_id) {
                Some(index) => {
                    let favorite = state.favorites.remove(index);
                    InverseOp::FavoriteInsert { favorite }
                }
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Favorites, inverse);
        self.notify(Collection::Favorites);

        let http = self.http.read().clone();
        match http.remove_favorite(product_id).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_favorites().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    // ==================== Addresses ====================

    pub async fn add_address(&self, req: AddressCreate) -> ClientResult<()> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let provisional_id = pending_id(correlation);
        let inverse = {
            let mut state = self.state.write();
            let first = state.addresses.is_empty();
            state.addresses.push(Address {
                id: Some(provisional_id.clone()),
                user: String::new(),
                name: req.name.clone(),
                phone: req.phone.clone(),
                street: req.street.clone(),
                city: req.city.clone(),
                state: req.state.clone(),
                postal_code: req.postal_code.clone(),
                is_default: first,
            });
            InverseOp::AddressRemove { id: provisional_id }
        };
        self.record(correlation, Collection::Addresses, inverse);
        self.notify(Collection::Addresses);

        let http = self.http.read().clone();
        match http.add_address(&req).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_addresses().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    pub async fn update_address(&self, id: &str, req: AddressUpdate) -> ClientResult<()> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state.address_mut(id) {
                Some(address) => {
                    let previous = address.clone();
                    apply_address_update(address, &req);
                    InverseOp::AddressPut { address: previous }
                }
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Addresses, inverse);
        self.notify(Collection::Addresses);

        let http = self.http.read().clone();
        match http.update_address(id, &req).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_addresses().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    /// Make one address the default; at most one stays flagged
    pub async fn set_default_address(&self, id: &str) -> ClientResult<()> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            if state.addresses.iter().any(|a| a.id.as_deref() == Some(id)) {
                let previous = state.addresses.clone();
                for address in state.addresses.iter_mut() {
                    address.is_default = address.id.as_deref() == Some(id);
                }
                InverseOp::AddressesRestore {
                    addresses: previous,
                }
            } else {
                InverseOp::None
            }
        };
        self.record(correlation, Collection::Addresses, inverse);
        self.notify(Collection::Addresses);

        let http = self.http.read().clone();
        match http.set_default_address(id).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_addresses().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    pub async fn delete_address(&self, id: &str) -> ClientResult<()> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state
                .addresses
                .iter()
                .position(|a| a.id.as_deref() == Some(id))
            {
                Some(index) => {
                    let address = state.addresses.remove(index);
                    InverseOp::AddressInsert { address }
                }
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Addresses, inverse);
        self.notify(Collection::Addresses);

        let http = self.http.read().clone();
        match http.delete_address(id).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_addresses().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    // ==================== Orders ====================

    /// Place an order; a provisional copy shows up at once
    pub async fn place_order(&self, req: OrderCreate) -> ClientResult<Order> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let provisional_id = pending_id(correlation);
        let inverse = {
            let mut state = self.state.write();
            let provisional = provisional_order(&state, &req, &provisional_id);
            state.orders.insert(0, provisional);
            InverseOp::OrderRemove { id: provisional_id }
        };
        self.record(correlation, Collection::Orders, inverse);
        self.notify(Collection::Orders);

        let http = self.http.read().clone();
        match http.place_order(&req).await {
            Ok(order) => {
                self.confirm(correlation);
                self.reconcile_orders().await;
                Ok(order)
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    /// Request a status change; the raw value goes to the server as-is
    pub async fn update_order_status(&self, id: &str, status: &str) -> ClientResult<()> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match (
                status.parse::<OrderStatus>(),
                state
                    .orders
                    .iter_mut()
                    .find(|o| o.id.as_deref() == Some(id)),
            ) {
                (Ok(requested), Some(order)) => {
                    let previous = order.status;
                    order.status = requested;
                    InverseOp::OrderSetStatus {
                        order_id: id.to_string(),
                        status: previous,
                    }
                }
                // Unknown value or uncached order: let the server decide
                _ => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Orders, inverse);
        self.notify(Collection::Orders);

        let http = self.http.read().clone();
        match http.update_order_status(id, status).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_orders().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    /// Record a payment gateway result on an order
    pub async fn pay_order(&self, id: &str, result: PaymentResult) -> ClientResult<()> {
        self.require_session()?;

        let correlation = Uuid::new_v4();
        let inverse = {
            let mut state = self.state.write();
            match state
                .orders
                .iter_mut()
                .find(|o| o.id.as_deref() == Some(id))
            {
                Some(order) => {
                    let previous = order.payment_result.take();
                    order.payment_result = Some(result.clone());
                    InverseOp::OrderSetPayment {
                        order_id: id.to_string(),
                        payment_result: previous,
                    }
                }
                None => InverseOp::None,
            }
        };
        self.record(correlation, Collection::Orders, inverse);
        self.notify(Collection::Orders);

        let http = self.http.read().clone();
        match http.pay_order(id, &result).await {
            Ok(_) => {
                self.confirm(correlation);
                self.reconcile_orders().await;
                Ok(())
            }
            Err(err) => Err(self.reject(correlation, err)),
        }
    }

    // ==================== Guest mode ====================

    fn guest_add_to_cart(&self, req: CartItemAdd) -> ClientResult<()> {
        {
            let mut state = self.state.write();
            let cart = state.cart.get_or_insert_with(empty_cart);
            match cart.items.iter_mut().find(|i| i.product_id == req.product_id) {
                Some(line) => line.quantity += req.quantity,
                None => cart.items.push(cart_line_from_hints(&req)),
            }
        }
        self.notify(Collection::Cart);
        self.persist();
        Ok(())
    }

    fn guest_set_cart_quantity(&self, product_id: &str, quantity: i32) -> ClientResult<()> {
        {
            let mut state = self.state.write();
            let line = state
                .cart
                .as_mut()
                .and_then(|c| c.items.iter_mut().find(|i| i.product_id == product_id))
                .ok_or_else(|| {
                    ClientError::NotFound(format!("Product {} is not in the cart", product_id))
                })?;
            line.quantity = quantity;
        }
        self.notify(Collection::Cart);
        self.persist();
        Ok(())
    }

    fn guest_remove_cart_item(&self, product_id: &str) -> ClientResult<()> {
        {
            let mut state = self.state.write();
            if let Some(cart) = state.cart.as_mut() {
                cart.items.retain(|i| i.product_id != product_id);
            }
        }
        self.notify(Collection::Cart);
        self.persist();
        Ok(())
    }

    fn guest_clear_cart(&self) -> ClientResult<()> {
        {
            let mut state = self.state.write();
            if let Some(cart) = state.cart.as_mut() {
                cart.items.clear();
            }
        }
        self.notify(Collection::Cart);
        self.persist();
        Ok(())
    }

    fn guest_add_favorite(&self, product_id: &str) -> ClientResult<()> {
        {
            let mut state = self.state.write();
            if state.favorites.iter().any(|f| f.product == product_id) {
                return Err(ClientError::Conflict(format!(
                    "Product {} is already favorited",
                    product_id
                )));
            }
            state.favorites.push(Favorite {
                id: Some(format!("guest:{}", Uuid::new_v4())),
                user: GUEST_USER.to_string(),
                product: product_id.to_string(),
                created_at: Some(Utc::now()),
            });
        }
        self.notify(Collection::Favorites);
        self.persist();
        Ok(())
    }

    fn guest_remove_favorite(&self, product_id: &str) -> ClientResult<()> {
        {
            let mut state = self.state.write();
            let before = state.favorites.len();
            state.favorites.retain(|f| f.product != product_id);
            if state.favorites.len() == before {
                return Err(ClientError::NotFound(format!(
                    "Product {} is not favorited",
                    product_id
                )));
            }
        }
        self.notify(Collection::Favorites);
        self.persist();
        Ok(())
    }

    fn require_session(&self) -> ClientResult<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::Unauthorized)
        }
    }

    // ==================== Journal plumbing ====================

    fn record(&self, id: Uuid, collection: Collection, inverse: InverseOp) {
        self.journal.lock().push(MutationEntry {
            id,
            collection,
            inverse,
        });
    }

    /// Mutation accepted: drop its journal entry
    fn confirm(&self, id: Uuid) {
        self.journal.lock().retain(|e| e.id != id);
    }

    /// Mutation refused: roll back exactly this entry
    fn reject(&self, id: Uuid, err: ClientError) -> ClientError {
        let entry = {
            let mut journal = self.journal.lock();
            journal
                .iter()
                .position(|e| e.id == id)
                .map(|index| journal.remove(index))
        };

        if matches!(err, ClientError::Unauthorized) {
            self.session_expired();
            return err;
        }

        if let Some(entry) = entry {
            self.state.write().revert(entry.inverse);
            self.notify(entry.collection);
        }
        if err.is_unavailable() {
            tracing::warn!(error = %err, "Dispatch failed; server unreachable");
        }
        err
    }

    fn install_cart(&self, cart: Cart) {
        self.state.write().cart = Some(cart);
        self.notify(Collection::Cart);
        self.persist();
    }

    async fn reconcile_favorites(&self) {
        let http = self.http.read().clone();
        match http.favorites().await {
            Ok(favorites) => {
                self.state.write().favorites = favorites;
                self.notify(Collection::Favorites);
                self.persist();
            }
            Err(err) => self.absorb_reconcile_failure(err),
        }
    }

    async fn reconcile_addresses(&self) {
        let http = self.http.read().clone();
        match http.addresses().await {
            Ok(addresses) => {
                self.state.write().addresses = addresses;
                self.notify(Collection::Addresses);
                self.persist();
            }
            Err(err) => self.absorb_reconcile_failure(err),
        }
    }

    async fn reconcile_orders(&self) {
        let http = self.http.read().clone();
        match http.my_orders().await {
            Ok(orders) => {
                self.state.write().orders = orders;
                self.notify(Collection::Orders);
                self.persist();
            }
            Err(err) => self.absorb_reconcile_failure(err),
        }
    }

    /// Refresh failed: expire on 401, otherwise keep what we have
    fn absorb_failure(&self, err: ClientError) -> ClientError {
        if matches!(err, ClientError::Unauthorized) {
            self.session_expired();
        } else if err.is_unavailable() {
            tracing::warn!(error = %err, "Server unreachable; keeping last known state");
        }
        err
    }

    /// The mutation itself succeeded; a failed reconcile fetch only
    /// means the optimistic state stands until the next refresh
    fn absorb_reconcile_failure(&self, err: ClientError) {
        if matches!(err, ClientError::Unauthorized) {
            self.session_expired();
        } else {
            tracing::warn!(error = %err, "Reconciliation fetch failed; keeping optimistic state");
            self.persist();
        }
    }

    fn notify(&self, collection: Collection) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.events.send(StoreEvent::Changed {
            collection,
            revision,
        });
    }

    fn notify_all(&self) {
        self.notify(Collection::Cart);
        self.notify(Collection::Favorites);
        self.notify(Collection::Addresses);
        self.notify(Collection::Orders);
    }

    fn persist(&self) {
        let authenticated = self.is_authenticated();
        let snapshot = {
            let state = self.state.read();
            let guest = self.guest.read();
            if authenticated {
                Snapshot {
                    cart: state.cart.clone(),
                    favorites: state.favorites.clone(),
                    addresses: state.addresses.clone(),
                    orders: state.orders.clone(),
                    guest: guest.clone(),
                    saved_at: Some(Utc::now()),
                }
            } else {
                Snapshot {
                    guest: GuestSection {
                        cart: state.cart.clone(),
                        favorites: state.favorites.clone(),
                    },
                    saved_at: Some(Utc::now()),
                    ..Default::default()
                }
            }
        };
        if let Err(err) = self.snapshots.save(&snapshot) {
            tracing::warn!(error = %err, "Failed to save snapshot");
        }
    }
}

fn empty_cart() -> Cart {
    Cart {
        id: None,
        user: GUEST_USER.to_string(),
        items: Vec::new(),
        updated_at: None,
    }
}

fn cart_line_from_hints(req: &CartItemAdd) -> CartItem {
    CartItem {
        product_id: req.product_id.clone(),
        name: req.name_hint.clone().unwrap_or_default(),
        image: req.image_hint.clone().unwrap_or_default(),
        price: req.price_hint.unwrap_or_default(),
        quantity: req.quantity,
    }
}

fn pending_id(correlation: Uuid) -> String {
    format!("pending:{}", correlation)
}

fn apply_address_update(address: &mut Address, req: &AddressUpdate) {
    if let Some(ref name) = req.name {
        address.name = name.clone();
    }
    if let Some(ref phone) = req.phone {
        address.phone = phone.clone();
    }
    if let Some(ref street) = req.street {
        address.street = street.clone();
    }
    if let Some(ref city) = req.city {
        address.city = city.clone();
    }
    if let Some(ref state) = req.state {
        address.state = state.clone();
    }
    if let Some(ref postal_code) = req.postal_code {
        address.postal_code = postal_code.clone();
    }
}

/// Local echo of an order about to be placed
///
/// Totals follow the server's fee rule closely enough for display; the
/// reconciliation fetch replaces this copy with the authoritative one.
fn provisional_order(state: &Collections, req: &OrderCreate, id: &str) -> Order {
    let subtotal = round2(
        req.items
            .iter()
            .map(|i| i.price * i.quantity as f64)
            .sum::<f64>(),
    );
    let shipping_fee = if subtotal >= 1000.0 { 0.0 } else { 100.0 };
    let shipping_address = state
        .addresses
        .iter()
        .find(|a| a.id.as_deref() == Some(req.address_id.as_str()))
        .map(OrderAddress::from)
        .unwrap_or_else(blank_order_address);

    Order {
        id: Some(id.to_string()),
        user: String::new(),
        items: req.items.clone(),
        shipping_address,
        payment_method: req.payment_method.clone(),
        payment_result: req.payment_result.clone(),
        subtotal,
        shipping_fee,
        total: round2(subtotal + shipping_fee),
        status: OrderStatus::Pending,
        notes: req.notes.clone(),
        created_at: Some(Utc::now()),
    }
}

fn blank_order_address() -> OrderAddress {
    OrderAddress {
        name: String::new(),
        phone: String::new(),
        street: String::new(),
        city: String::new(),
        state: String::new(),
        postal_code: String::new(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Shared cart store with persistence and checkout

use crate::{
    cart::line::{Cart, CartLine, LineUpdate},
    gateway::Backend,
    models::{Client, Product, ProductId, Sale},
    storage::{LocalStore, CART_KEY},
    Error, Result,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Message shown when checkout fails without a server detail
pub const CHECKOUT_FAILED: &str = "Failed to complete the sale";

/// Cart store for one session
///
/// The engine is the only writer of the cart; views read snapshots. Every
/// mutation is written to the local store so the cart survives a restart.
///
/// # Example
/// ```rust,no_run
/// use pos_admin::cart::CartEngine;
/// use pos_admin::gateway::Gateway;
/// use pos_admin::storage::LocalStore;
/// use std::sync::Arc;
///
/// # async fn example(gateway: Gateway, store: Arc<LocalStore>, product: pos_admin::models::Product) -> pos_admin::Result<()> {
/// let cart = CartEngine::new(gateway, store)?;
/// cart.add_item(&product).await;
///
/// let total = cart.total().await;
/// cart.validate_payment(total).await?;
/// let sale = cart.checkout(Some(total)).await?;
/// println!("Sale {} created", sale.id);
/// # Ok(())
/// # }
/// ```
pub struct CartEngine<B: Backend> {
    backend: B,
    cart: RwLock<Cart>,
    store: Arc<LocalStore>,
    checking_out: AtomicBool,
}

impl<B: Backend> CartEngine<B> {
    /// Create the engine, restoring a cart saved by a previous run
    pub fn new(backend: B, store: Arc<LocalStore>) -> Result<Self> {
        let cart = match store.get_json::<Cart>(CART_KEY) {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!("Discarding unreadable saved cart: {}", e);
                Cart::new()
            }
        };

        Ok(Self {
            backend,
            cart: RwLock::new(cart),
            store,
            checking_out: AtomicBool::new(false),
        })
    }

    async fn mutate<R>(&self, apply: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.cart.write().await;
        let result = apply(&mut cart);
        self.persist(&cart);
        result
    }

    fn persist(&self, cart: &Cart) {
        if let Err(e) = self.store.set_json(CART_KEY, cart) {
            warn!("Failed to persist cart: {}", e);
        }
    }

    #[cfg(test)]
    pub(crate) async fn read_guard(&self) -> tokio::sync::RwLockReadGuard<'_, Cart> {
        self.cart.read().await
    }

    /// Copy of the current cart
    pub async fn snapshot(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Copy of the current lines
    pub async fn lines(&self) -> Vec<CartLine> {
        self.cart.read().await.lines().to_vec()
    }

    /// Selected buyer
    pub async fn selected_client(&self) -> Option<Client> {
        self.cart.read().await.selected_client().cloned()
    }

    /// Total amount
    pub async fn total(&self) -> Decimal {
        self.cart.read().await.total()
    }

    /// Total quantity in base units
    pub async fn item_count(&self) -> u64 {
        self.cart.read().await.item_count()
    }

    /// Whether a checkout call is in flight
    ///
    /// Views disable their checkout trigger while this is set.
    pub fn is_checking_out(&self) -> bool {
        self.checking_out.load(Ordering::SeqCst)
    }

    /// Add one unit (or one pack) of a product
    pub async fn add_item(&self, product: &Product) {
        self.mutate(|cart| cart.add_item(product)).await
    }

    /// Remove a product's line
    pub async fn remove_item(&self, product_id: ProductId) {
        self.mutate(|cart| cart.remove_item(product_id)).await
    }

    /// Merge a partial edit into a line
    pub async fn update_line(&self, product_id: ProductId, update: LineUpdate) {
        self.mutate(|cart| cart.update_line(product_id, update)).await
    }

    /// Commit a new unit price
    pub async fn set_line_price(&self, product_id: ProductId, price: Decimal) -> Result<()> {
        self.mutate(|cart| cart.set_line_price(product_id, price)).await
    }

    /// Commit a price typed by the user
    pub async fn set_line_price_input(&self, product_id: ProductId, input: &str) -> Result<()> {
        self.mutate(|cart| cart.set_line_price_input(product_id, input))
            .await
    }

    /// Flip pack mode on a line
    pub async fn toggle_pack_mode(&self, product_id: ProductId) {
        self.mutate(|cart| cart.toggle_pack_mode(product_id)).await
    }

    /// Select the buyer, or `None` for a walk-in buyer
    pub async fn set_client(&self, client: Option<Client>) {
        self.mutate(|cart| cart.set_client(client)).await
    }

    /// Empty the cart and deselect the buyer
    pub async fn clear(&self) {
        self.mutate(Cart::clear).await
    }

    /// Check the walk-in payment rule; call before `checkout`
    pub async fn validate_payment(&self, paid_amount: Decimal) -> Result<()> {
        self.cart.read().await.validate_payment(paid_amount)
    }

    /// Submit the cart as a sale
    ///
    /// `paid_amount` defaults to the cart total. Issues exactly one backend
    /// call. On success the cart is cleared and the created sale returned;
    /// on failure the cart is left as it was so the user can retry.
    pub async fn checkout(&self, paid_amount: Option<Decimal>) -> Result<Sale> {
        let request = {
            let cart = self.cart.read().await;
            if cart.is_empty() {
                return Err(Error::EmptyCart);
            }
            cart.to_sale_request(paid_amount)
        };

        if self
            .checking_out
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::CheckoutInProgress);
        }

        // The flag stays set until a successful sale has emptied the cart
        match self.backend.create_sale(&request).await {
            Ok(sale) => {
                info!(
                    "Sale {} created with {} lines, paid {}",
                    sale.id,
                    request.items.len(),
                    request.paid_amount
                );
                self.clear().await;
                self.checking_out.store(false, Ordering::SeqCst);
                Ok(sale)
            }
            Err(e) => {
                self.checking_out.store(false, Ordering::SeqCst);
                warn!("Checkout failed: {}", e);
                Err(Error::Checkout(
                    e.detail().unwrap_or(CHECKOUT_FAILED).to_string(),
                ))
            }
        }
    }
}

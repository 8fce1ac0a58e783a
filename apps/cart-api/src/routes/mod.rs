//! Route table.
//!
//! ```text
//! POST   /cart/:customer_id/items               add_item
//! GET    /cart/:customer_id                     get_cart
//! PUT    /cart/:customer_id/items/:product_id   update_item_quantity
//! DELETE /cart/:customer_id/items/:product_id   remove_item
//! DELETE /cart/:customer_id                     clear_cart
//!
//! POST   /products                              create
//! GET    /products?limit=N                      list
//! GET    /products/:id                          get
//! POST   /products/:id/stock                    adjust stock by delta
//!
//! GET    /health
//! ```

pub mod cart;
pub mod health;
pub mod products;

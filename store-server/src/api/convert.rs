//! 类型转换模块
//!
//! 将数据库模型 (db::models) 转换为 API 响应模型 (shared::models)

use crate::db::models as db;
use shared::client::UserInfo;
use shared::models as api;

// ============ Helper ============

pub fn record_id_to_string(id: &surrealdb::RecordId) -> String {
    id.to_string()
}

pub fn option_record_id_to_string(id: &Option<surrealdb::RecordId>) -> Option<String> {
    id.as_ref().map(record_id_to_string)
}

// ============ User ============

impl From<db::User> for UserInfo {
    fn from(u: db::User) -> Self {
        Self {
            id: option_record_id_to_string(&u.id).unwrap_or_default(),
            name: u.name,
            email: u.email,
            is_admin: u.is_admin,
        }
    }
}

// ============ Product ============

impl From<db::Review> for api::Review {
    fn from(r: db::Review) -> Self {
        Self {
            user: record_id_to_string(&r.user),
            name: r.name,
            rating: r.rating,
            comment: r.comment,
            created_at: Some(r.created_at),
        }
    }
}

impl From<db::Product> for api::Product {
    fn from(p: db::Product) -> Self {
        Self {
            id: option_record_id_to_string(&p.id),
            name: p.name,
            description: p.description,
            price: p.price,
            image: p.image,
            category: p.category,
            brand: p.brand,
            count_in_stock: p.count_in_stock,
            rating: p.rating,
            num_reviews: p.num_reviews,
            reviews: p.reviews.into_iter().map(Into::into).collect(),
            created_at: Some(p.created_at),
        }
    }
}

// ============ Cart ============

impl From<db::CartItem> for api::CartItem {
    fn from(i: db::CartItem) -> Self {
        Self {
            product_id: record_id_to_string(&i.product),
            name: i.name,
            image: i.image,
            price: i.price,
            quantity: i.quantity,
        }
    }
}

impl From<db::Cart> for api::Cart {
    fn from(c: db::Cart) -> Self {
        Self {
            id: option_record_id_to_string(&c.id),
            user: record_id_to_string(&c.user),
            items: c.items.into_iter().map(Into::into).collect(),
            updated_at: Some(c.updated_at),
        }
    }
}

// ============ Favorite ============

impl From<db::Favorite> for api::Favorite {
    fn from(f: db::Favorite) -> Self {
        Self {
            id: option_record_id_to_string(&f.id),
            user: record_id_to_string(&f.user),
            product: record_id_to_string(&f.product),
            created_at: Some(f.created_at),
        }
    }
}

// ============ Address ============

impl From<db::Address> for api::Address {
    fn from(a: db::Address) -> Self {
        Self {
            id: option_record_id_to_string(&a.id),
            user: record_id_to_string(&a.user),
            name: a.name,
            phone: a.phone,
            street: a.street,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
            is_default: a.is_default,
        }
    }
}

// ============ PaymentMethod ============

impl From<db::PaymentMethod> for api::PaymentMethod {
    fn from(m: db::PaymentMethod) -> Self {
        Self {
            id: option_record_id_to_string(&m.id),
            user: record_id_to_string(&m.user),
            detail: m.detail,
            is_default: m.is_default,
        }
    }
}

// ============ Order ============

impl From<db::OrderItem> for api::OrderItem {
    fn from(i: db::OrderItem) -> Self {
        Self {
            product_id: record_id_to_string(&i.product),
            name: i.name,
            price: i.price,
            quantity: i.quantity,
            image: i.image,
        }
    }
}

impl From<db::OrderAddress> for api::OrderAddress {
    fn from(a: db::OrderAddress) -> Self {
        Self {
            name: a.name,
            phone: a.phone,
            street: a.street,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
        }
    }
}

impl From<db::Order> for api::Order {
    fn from(o: db::Order) -> Self {
        Self {
            id: option_record_id_to_string(&o.id),
            user: record_id_to_string(&o.user),
            items: o.items.into_iter().map(Into::into).collect(),
            shipping_address: o.shipping_address.into(),
            payment_method: o.payment_method,
            payment_result: o.payment_result,
            subtotal: o.subtotal,
            shipping_fee: o.shipping_fee,
            total: o.total,
            status: o.status,
            notes: o.notes,
            created_at: Some(o.created_at),
        }
    }
}

// ============ Wire payloads to database payloads ============

impl From<api::ProductCreate> for db::ProductCreate {
    fn from(p: api::ProductCreate) -> Self {
        Self {
            name: p.name,
            description: p.description,
            price: p.price,
            image: p.image,
            category: p.category,
            brand: p.brand,
            count_in_stock: p.count_in_stock,
        }
    }
}

impl From<api::ProductUpdate> for db::ProductUpdate {
    fn from(p: api::ProductUpdate) -> Self {
        Self {
            name: p.name,
            description: p.description,
            price: p.price,
            image: p.image,
            category: p.category,
            brand: p.brand,
            count_in_stock: p.count_in_stock,
        }
    }
}

impl From<api::AddressCreate> for db::AddressCreate {
    fn from(a: api::AddressCreate) -> Self {
        Self {
            name: a.name,
            phone: a.phone,
            street: a.street,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
        }
    }
}

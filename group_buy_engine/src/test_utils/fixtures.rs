use crate::{
    db_types::{
        DividendRate,
        GroupBuying,
        Money,
        NewGroupBuying,
        NewOrder,
        NewProduct,
        Order,
        ProductConfig,
        UserAccount,
    },
    traits::{JoinRequest, LedgerManagement},
    SqliteDatabase,
};

/// Describes a group buy to seed.
#[derive(Debug, Clone)]
pub struct GroupFixture {
    pub group_size: i64,
    pub winner_count: i64,
    pub dividend_rate: DividendRate,
    /// The actual amount of each member's order. One member per entry.
    pub amounts: Vec<Money>,
    /// How many of the orders (from the front) are paid before joining
    pub paid: usize,
}

impl GroupFixture {
    /// `members` members with paid orders of `amount` each, joining a group of exactly that size.
    pub fn full(members: usize, amount: Money, winner_count: i64, dividend_rate: DividendRate) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        let group_size = members as i64;
        Self { group_size, winner_count, dividend_rate, amounts: vec![amount; members], paid: members }
    }

    pub fn with_group_size(mut self, group_size: i64) -> Self {
        self.group_size = group_size;
        self
    }

    pub fn with_paid(mut self, paid: usize) -> Self {
        self.paid = paid;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SeededGroup {
    pub product: ProductConfig,
    pub group: GroupBuying,
    pub users: Vec<UserAccount>,
    pub orders: Vec<Order>,
}

/// Seeds a product, one user and order per member, opens the group with the first user as leader, and joins every
/// member. The returned group reflects the state after the last join.
pub async fn seed_group(db: &SqliteDatabase, fixture: GroupFixture) -> SeededGroup {
    let tag = rand::random::<u32>();
    let product = db
        .insert_product(NewProduct::new(format!("product-{tag}"), fixture.winner_count, fixture.dividend_rate))
        .await
        .expect("Error inserting product");
    let mut users = Vec::with_capacity(fixture.amounts.len());
    let mut orders = Vec::with_capacity(fixture.amounts.len());
    for (i, amount) in fixture.amounts.iter().enumerate() {
        let user = db.insert_user(&format!("user-{tag}-{i}")).await.expect("Error inserting user");
        let order = db
            .insert_order(NewOrder::new(format!("order-{tag}-{i}"), user.id, product.id, *amount))
            .await
            .expect("Error inserting order");
        let order = if i < fixture.paid {
            db.mark_order_paid(order.id).await.expect("Error marking order paid")
        } else {
            order
        };
        users.push(user);
        orders.push(order);
    }
    let leader = users.first().map(|u| u.id).expect("A group fixture needs at least one member");
    let mut group = db
        .open_group(NewGroupBuying::new(format!("G-{tag}"), product.id, leader, fixture.group_size))
        .await
        .expect("Error opening group");
    for (user, order) in users.iter().zip(orders.iter()) {
        let outcome = db.record_join(JoinRequest::new(group.id, order.id, user.id)).await.expect("Error joining group");
        group = outcome.group;
    }
    SeededGroup { product, group, users, orders }
}

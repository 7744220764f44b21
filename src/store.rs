use hashbrown::HashMap;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use log::*;

use crate::{
    entities::{Customer, Identified, Order, OrderItem, Person, Product, Student, Teacher},
    error::{ensure_non_negative, StoreError},
    records::{OrderId, OrderRecord, ProductId},
};

/// First item matching `predicate`
pub fn find<T, P>(items: &[T], mut predicate: P) -> Option<&T>
where
    P: FnMut(&T) -> bool,
{
    items.iter().find(|item| predicate(*item))
}

/// Max existing id + 1, or `default` for an empty sequence.
/// Fails once the ids are exhausted
pub fn next_id<T: Identified>(items: &[T], default: u32) -> Result<u32, StoreError> {
    match items.iter().map(|item| item.id()).max() {
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StoreError::validation(format!("No id left after {}", max))),
        None => Ok(default),
    }
}

/// What happened while resolving the orders file against the products
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LoadSummary {
    /// Orders added to the store
    pub orders: usize,
    /// Order items dropped because their product is unknown or the quantity is zero
    pub skipped_items: usize,
}

/// In-memory "database" of every record for one run of the program
#[derive(Debug, Default)]
pub struct EntityStore {
    products: Vec<Product>,
    /// Product id -> position in `products`
    product_index: HashMap<ProductId, usize>,
    /// Keyed by name, in the order customers were first seen
    customers: IndexMap<String, Customer>,
    orders: Vec<Order>,
    students: Vec<Student>,
    teachers: Vec<Teacher>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the loaded products. A repeated id replaces the earlier lookup entry.
    /// Products with a negative price are skipped, returns how many were
    pub fn load_products(&mut self, products: impl IntoIterator<Item = Product>) -> usize {
        let mut skipped = 0;
        for product in products {
            if let Err(err) = ensure_non_negative("Price", product.price) {
                warn!("Skipping product {}. {}", product.id, err);
                skipped += 1;
                continue;
            }
            if self.product_index.contains_key(&product.id) {
                warn!("Duplicate product id {}, keeping the last one", product.id);
            }
            self.product_index.insert(product.id, self.products.len());
            self.products.push(product);
        }
        info!("{} products in store", self.products.len());
        skipped
    }

    /// Resolves the order records against the known products and adds them.
    /// Items with an unknown product or no quantity are skipped and counted
    pub fn load_orders(&mut self, records: impl IntoIterator<Item = OrderRecord>) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for record in records {
            let mut items = Vec::with_capacity(record.items.len());
            for item in record.items {
                if item.qty == 0 || self.product(item.product_id).is_none() {
                    warn!(
                        "Skipping item of order {}: product {} x {}",
                        record.order_id, item.product_id, item.qty
                    );
                    summary.skipped_items += 1;
                    continue;
                }
                items.push(OrderItem {
                    product_id: item.product_id,
                    quantity: item.qty,
                });
            }

            match self.add_order(Order::new(record.order_id, record.customer, items)) {
                Ok(()) => summary.orders += 1,
                Err(err) => error!("Order {} not loaded. {}", record.order_id, err),
            }
        }
        info!(
            "{} orders loaded, {} items skipped",
            summary.orders, summary.skipped_items
        );
        summary
    }

    /// Students with a negative mark are skipped, returns how many were
    pub fn load_students(&mut self, students: impl IntoIterator<Item = Student>) -> usize {
        let mut skipped = 0;
        for student in students {
            let negative = student
                .marks
                .iter()
                .map(|(subject, score)| ensure_non_negative(subject, *score))
                .find_map(Result::err);
            match negative {
                Some(err) => {
                    warn!("Skipping student {}. {}", student.id, err);
                    skipped += 1;
                }
                None => self.students.push(student),
            }
        }
        info!("{} students in store", self.students.len());
        skipped
    }

    /// Teachers with a negative salary are skipped, returns how many were
    pub fn load_teachers(&mut self, teachers: impl IntoIterator<Item = Teacher>) -> usize {
        let mut skipped = 0;
        for teacher in teachers {
            match ensure_non_negative("Salary", teacher.salary) {
                Ok(()) => self.teachers.push(teacher),
                Err(err) => {
                    warn!("Skipping teacher {}. {}", teacher.id, err);
                    skipped += 1;
                }
            }
        }
        info!("{} teachers in store", self.teachers.len());
        skipped
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.product_index.get(&id).map(|&pos| &self.products[pos])
    }

    pub fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        let pos = *self.product_index.get(&id)?;
        self.products.get_mut(pos)
    }

    /// Looks up a product and checks `quantity` units are available, without
    /// touching the stock
    pub fn check_availability(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<&Product, StoreError> {
        let product = self
            .product(id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.check_stock(quantity)?;
        Ok(product)
    }

    /// Customers in the order they were first seen
    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn customer(&self, name: &str) -> Option<&Customer> {
        self.customers.get(name)
    }

    /// Returns the customer called `name`, creating it first if it's not known yet
    pub fn get_or_create_customer(&mut self, name: &str) -> &mut Customer {
        self.customers
            .entry(name.to_string())
            .or_insert_with(|| Customer::new(name))
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        find(&self.orders, |order| order.order_id() == order_id)
    }

    /// Appends the order to the order list and to its customer's history.
    /// Returns an `Error` if the order id is already taken
    pub fn add_order(&mut self, order: Order) -> Result<(), StoreError> {
        if self.order(order.order_id()).is_some() {
            return Err(StoreError::validation(format!(
                "Order id {} already exists",
                order.order_id()
            )));
        }

        self.get_or_create_customer(order.customer())
            .add_order(order.order_id());
        debug!("Order {} added for {}", order.order_id(), order.customer());
        self.orders.push(order);
        Ok(())
    }

    /// Σ(price × quantity) using the current product prices
    pub fn order_total(&self, order: &Order) -> Decimal {
        order
            .items()
            .iter()
            .filter_map(|item| {
                self.product(item.product_id)
                    .map(|product| product.price * Decimal::from(item.quantity))
            })
            .sum()
    }

    /// Σ(order total) over the orders the customer owns
    pub fn customer_total(&self, customer: &Customer) -> Decimal {
        customer
            .orders()
            .iter()
            .filter_map(|&order_id| self.order(order_id))
            .map(|order| self.order_total(order))
            .sum()
    }

    /// Orders of the customer called `name`, empty if the customer is unknown
    pub fn customer_orders(&self, name: &str) -> Vec<&Order> {
        self.customer(name)
            .map(|customer| {
                customer
                    .orders()
                    .iter()
                    .filter_map(|&order_id| self.order(order_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn add_student(&mut self, student: Student) {
        debug!("Student {} added", student.id);
        self.students.push(student);
    }

    pub fn add_teacher(&mut self, teacher: Teacher) {
        debug!("Teacher {} added", teacher.id);
        self.teachers.push(teacher);
    }

    /// Students first, then teachers
    pub fn people(&self) -> impl Iterator<Item = Person<'_>> {
        self.students
            .iter()
            .map(Person::Student)
            .chain(self.teachers.iter().map(Person::Teacher))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{entities::PersonalInfo, records::OrderItemRecord};

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store.load_products(vec![
            Product::new(1, "Laptop", "Electronics", dec!(10), 2),
            Product::new(2, "Pen", "Stationery", dec!(5), 10),
        ]);
        store
    }

    fn record(order_id: OrderId, customer: &str, items: &[(ProductId, u32)]) -> OrderRecord {
        OrderRecord {
            order_id,
            customer: customer.to_string(),
            items: items
                .iter()
                .map(|&(product_id, qty)| OrderItemRecord { product_id, qty })
                .collect(),
        }
    }

    #[test]
    fn test_next_id() {
        let store = store();
        assert_eq!(next_id(store.products(), 1), Ok(3));
        assert_eq!(next_id(store.orders(), 101), Ok(101));
    }

    #[test]
    fn test_next_id_exhausted() {
        let mut store = store();
        store.load_products(vec![Product::new(u32::MAX, "Ink", "Stationery", dec!(2), 1)]);
        assert!(matches!(
            next_id(store.products(), 1),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_negative_amounts_skipped_on_load() {
        let mut store = EntityStore::new();
        let skipped = store.load_products(vec![
            Product::new(1, "Pen", "Stationery", dec!(-5), 3),
            Product::new(2, "Ink", "Stationery", dec!(2), 3),
        ]);
        assert_eq!(skipped, 1);
        assert!(store.product(1).is_none());
        assert_eq!(store.products().len(), 1);

        let skipped = store.load_teachers(vec![
            Teacher {
                id: 1,
                info: PersonalInfo::new("Mr. Rao", None),
                subject: "Math".to_string(),
                salary: dec!(-1),
            },
            Teacher {
                id: 2,
                info: PersonalInfo::new("Ms. Iyer", None),
                subject: "Science".to_string(),
                salary: dec!(0),
            },
        ]);
        assert_eq!(skipped, 1);
        assert_eq!(store.teachers()[0].id, 2);

        let skipped = store.load_students(vec![Student {
            id: 1,
            info: PersonalInfo::new("Asha", Some(15)),
            grade: "10".to_string(),
            marks: vec![("Math".to_string(), dec!(80)), ("Science".to_string(), dec!(-2))]
                .into_iter()
                .collect(),
        }]);
        assert_eq!(skipped, 1);
        assert!(store.students().is_empty());
    }

    #[test]
    fn test_find() {
        let store = store();
        assert_eq!(find(store.products(), |p| p.name == "Pen").map(|p| p.id), Some(2));
        assert!(find(store.products(), |p| p.price > dec!(100)).is_none());
    }

    #[test]
    fn test_load_orders_skips_and_counts_unknown_products() {
        let mut store = store();
        let summary = store.load_orders(vec![
            record(101, "Ravi", &[(1, 1), (99, 4), (2, 0)]),
            record(102, "Meera", &[(2, 3)]),
        ]);

        assert_eq!(
            summary,
            LoadSummary {
                orders: 2,
                skipped_items: 2
            }
        );
        assert_eq!(store.order(101).unwrap().items().len(), 1);
        // Loading orders never touches the stock
        assert_eq!(store.product(1).unwrap().stock(), 2);
    }

    #[test]
    fn test_order_and_customer_stay_consistent() {
        let mut store = store();
        store.load_orders(vec![
            record(101, "Ravi", &[(1, 1), (2, 2)]),
            record(102, "Meera", &[(2, 1)]),
            record(103, "Ravi", &[(2, 4)]),
        ]);

        let ravi = store.customer("Ravi").unwrap();
        assert_eq!(ravi.orders(), &[101, 103]);
        assert_eq!(store.customer_total(ravi), dec!(40));
        assert_eq!(store.order_total(store.order(101).unwrap()), dec!(20));

        let names: Vec<&str> = store.customers().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Ravi", "Meera"]);

        let history: Vec<OrderId> = store
            .customer_orders("Ravi")
            .iter()
            .map(|o| o.order_id())
            .collect();
        assert_eq!(history, vec![101, 103]);
        assert!(store.customer_orders("Nobody").is_empty());
    }

    #[test]
    fn test_duplicate_order_id_rejected() {
        let mut store = store();
        assert!(store.add_order(Order::new(101, "Ravi", vec![])).is_ok());
        assert!(store.add_order(Order::new(101, "Meera", vec![])).is_err());
        assert_eq!(store.orders().len(), 1);
        assert!(store.customer("Meera").is_none());
    }

    #[test]
    fn test_order_total_follows_current_prices() {
        let mut store = store();
        store
            .add_order(Order::new(
                101,
                "Ravi",
                vec![OrderItem {
                    product_id: 2,
                    quantity: 3,
                }],
            ))
            .unwrap();
        assert_eq!(store.order_total(&store.orders()[0]), dec!(15));

        store.product_mut(2).unwrap().price = dec!(6);
        assert_eq!(store.order_total(&store.orders()[0]), dec!(18));
    }

    #[test]
    fn test_get_or_create_customer() {
        let mut store = store();
        store.get_or_create_customer("Ravi");
        store.get_or_create_customer("Ravi");
        assert_eq!(store.customers().count(), 1);
        assert!(store.customer("Ravi").unwrap().orders().is_empty());
    }

    #[test]
    fn test_check_availability() {
        let store = store();
        assert!(store.check_availability(1, 2).is_ok());
        assert!(matches!(
            store.check_availability(1, 3),
            Err(StoreError::InsufficientStock { .. })
        ));
        assert!(matches!(
            store.check_availability(7, 1),
            Err(StoreError::NotFound { .. })
        ));
    }
}

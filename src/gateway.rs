use indexmap::IndexMap;
use rust_decimal::Decimal;

use log::*;

use crate::{
    config::IdConfig,
    entities::{Order, OrderItem, PersonalInfo, Student, Teacher},
    error::{ensure_non_negative, StoreError},
    persistence::Persistence,
    records::{OrderId, PersonId, ProductId, Quantity},
    store::{next_id, EntityStore},
};

/// One line of an order as asked for by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// An order line that was dropped, and why
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub reason: StoreError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Decimal,
}

/// Result of `place_order`. Items are handled one by one, so an order can be
/// placed with some of its items rejected
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    /// None when no item was accepted
    pub placed: Option<PlacedOrder>,
    pub rejected: Vec<RejectedItem>,
}

/// The only way the records change after loading. Every change is saved
/// right away; a failed save is returned but the change stays in memory
pub struct MutationGateway<P: Persistence> {
    store: EntityStore,
    persistence: P,
    ids: IdConfig,
}

impl<P: Persistence> MutationGateway<P> {
    pub fn new(store: EntityStore, persistence: P, ids: IdConfig) -> Self {
        Self {
            store,
            persistence,
            ids,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Takes the stock for each requested item, then records the accepted ones
    /// as a new order of `customer_name` and saves products and orders
    pub fn place_order(
        &mut self,
        customer_name: &str,
        items: &[OrderRequest],
    ) -> Result<OrderOutcome, StoreError> {
        let customer_name = customer_name.trim();
        if customer_name.is_empty() {
            return Err(StoreError::validation("Customer name cannot be empty"));
        }

        let order_id = next_id(self.store.orders(), self.ids.first_order_id)?;

        let mut accepted = Vec::with_capacity(items.len());
        let mut rejected = Vec::new();
        for request in items {
            debug!("Processing order item: {:?}", request);
            match self.take_item(request) {
                Ok(()) => accepted.push(OrderItem {
                    product_id: request.product_id,
                    quantity: request.quantity,
                }),
                Err(reason) => {
                    warn!("Order item rejected. {} | {:?}", reason, request);
                    rejected.push(RejectedItem {
                        product_id: request.product_id,
                        quantity: request.quantity,
                        reason,
                    });
                }
            }
        }

        if accepted.is_empty() {
            info!("No items accepted for {}, order not placed", customer_name);
            return Ok(OrderOutcome {
                placed: None,
                rejected,
            });
        }

        let order = Order::new(order_id, customer_name, accepted);
        let total = self.store.order_total(&order);
        self.store.add_order(order)?;
        info!("Order {} placed for {}, total {}", order_id, customer_name, total);

        self.save(|persistence, store| {
            persistence.save_products(store.products())?;
            persistence.save_orders(store.orders())
        })?;

        Ok(OrderOutcome {
            placed: Some(PlacedOrder { order_id, total }),
            rejected,
        })
    }

    fn take_item(&mut self, request: &OrderRequest) -> Result<(), StoreError> {
        if request.quantity == 0 {
            return Err(StoreError::validation("Quantity must be positive"));
        }
        self.store
            .product_mut(request.product_id)
            .ok_or_else(|| StoreError::not_found("Product", request.product_id))?
            .take_stock(request.quantity)
    }

    /// Registers a new student and saves the students file.
    /// Returns the new id
    pub fn add_student(
        &mut self,
        name: &str,
        age: u32,
        grade: &str,
        marks: IndexMap<String, Decimal>,
    ) -> Result<PersonId, StoreError> {
        let name = required("Student name", name)?;
        for (subject, score) in &marks {
            ensure_non_negative(&format!("Mark for {}", subject), *score)?;
        }

        let id = next_id(self.store.students(), self.ids.first_person_id)?;
        self.store.add_student(Student {
            id,
            info: PersonalInfo::new(name, Some(age)),
            grade: grade.trim().to_string(),
            marks,
        });
        info!("Student {} added with id {}", name, id);

        self.save(|persistence, store| persistence.save_students(store.students()))?;
        Ok(id)
    }

    /// Registers a new teacher and saves the teachers file.
    /// Returns the new id
    pub fn add_teacher(
        &mut self,
        name: &str,
        subject: &str,
        salary: Decimal,
    ) -> Result<PersonId, StoreError> {
        let name = required("Teacher name", name)?;
        let subject = required("Subject", subject)?;
        ensure_non_negative("Salary", salary)?;

        let id = next_id(self.store.teachers(), self.ids.first_person_id)?;
        self.store.add_teacher(Teacher {
            id,
            info: PersonalInfo::new(name, None),
            subject: subject.to_string(),
            salary,
        });
        info!("Teacher {} added with id {}", name, id);

        self.save(|persistence, store| persistence.save_teachers(store.teachers()))?;
        Ok(id)
    }

    fn save<F>(&self, write: F) -> Result<(), StoreError>
    where
        F: FnOnce(&P, &EntityStore) -> Result<(), StoreError>,
    {
        write(&self.persistence, &self.store).map_err(|err| {
            error!("Save failed, in-memory changes are kept. {}", err);
            err
        })
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::validation(format!("{} cannot be empty", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{entities::Product, persistence::MemoryPersistence};

    fn gateway(persistence: MemoryPersistence) -> MutationGateway<MemoryPersistence> {
        let mut store = EntityStore::new();
        store.load_products(vec![
            Product::new(1, "Laptop", "Electronics", dec!(10), 2),
            Product::new(2, "Pen", "Stationery", dec!(5), 10),
        ]);
        MutationGateway::new(store, persistence, IdConfig::default())
    }

    fn request(product_id: ProductId, quantity: Quantity) -> OrderRequest {
        OrderRequest {
            product_id,
            quantity,
        }
    }

    /*  Order scenario:
            1) Laptop has 2 units, Pen has 10
            2) Ask for 3 laptops and 1 pen
            3) Laptops are rejected, the pen goes through and the order costs 5
    */
    #[test]
    fn test_place_order_rejects_insufficient_stock() {
        let mut gateway = gateway(MemoryPersistence::default());

        let outcome = gateway
            .place_order("Ravi", &[request(1, 3), request(2, 1)])
            .unwrap();

        assert_eq!(
            outcome.placed,
            Some(PlacedOrder {
                order_id: 101,
                total: dec!(5)
            })
        );
        assert_eq!(
            outcome.rejected,
            vec![RejectedItem {
                product_id: 1,
                quantity: 3,
                reason: StoreError::InsufficientStock {
                    product_id: 1,
                    available: 2,
                    requested: 3
                }
            }]
        );

        let store = gateway.store();
        assert_eq!(store.product(1).unwrap().stock(), 2);
        assert_eq!(store.product(2).unwrap().stock(), 9);
        assert_eq!(store.customer("Ravi").unwrap().orders(), &[101]);
        assert_eq!(store.order_total(store.order(101).unwrap()), dec!(5));
        assert_eq!(
            *gateway.persistence.saved.borrow(),
            vec!["products", "orders"]
        );
    }

    #[test]
    fn test_repeated_product_checked_against_remaining_stock() {
        let mut gateway = gateway(MemoryPersistence::default());

        let outcome = gateway
            .place_order("Ravi", &[request(1, 2), request(1, 1)])
            .unwrap();

        assert_eq!(outcome.placed.unwrap().total, dec!(20));
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(gateway.store().product(1).unwrap().stock(), 0);
    }

    #[test]
    fn test_unknown_product_and_zero_quantity_are_skipped() {
        let mut gateway = gateway(MemoryPersistence::default());

        let outcome = gateway
            .place_order("Ravi", &[request(9, 1), request(2, 0), request(2, 4)])
            .unwrap();

        let reasons: Vec<&StoreError> = outcome.rejected.iter().map(|r| &r.reason).collect();
        assert!(matches!(reasons[0], StoreError::NotFound { .. }));
        assert!(matches!(reasons[1], StoreError::Validation(_)));
        assert_eq!(outcome.placed.unwrap().total, dec!(20));
        assert_eq!(gateway.store().product(2).unwrap().stock(), 6);
    }

    #[test]
    fn test_nothing_accepted_places_nothing() {
        let mut gateway = gateway(MemoryPersistence::default());

        let outcome = gateway.place_order("Ravi", &[request(1, 5)]).unwrap();

        assert_eq!(outcome.placed, None);
        assert!(gateway.store().orders().is_empty());
        assert!(gateway.store().customer("Ravi").is_none());
        assert!(gateway.persistence.saved.borrow().is_empty());
    }

    #[test]
    fn test_empty_customer_name() {
        let mut gateway = gateway(MemoryPersistence::default());
        assert!(matches!(
            gateway.place_order("  ", &[request(2, 1)]),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(gateway.store().product(2).unwrap().stock(), 10);
    }

    #[test]
    fn test_stock_never_negative_over_many_orders() {
        let mut gateway = gateway(MemoryPersistence::default());
        let mut accepted = 0;
        for quantity in [3, 4, 2, 5, 1, 1] {
            let outcome = gateway.place_order("Meera", &[request(2, quantity)]).unwrap();
            if outcome.placed.is_some() {
                accepted += quantity;
            }
        }
        assert_eq!(accepted, 10);
        assert_eq!(gateway.store().product(2).unwrap().stock(), 0);
        let ids: Vec<OrderId> = gateway.store().orders().iter().map(|o| o.order_id()).collect();
        assert_eq!(ids, vec![101, 102, 103, 104]);
    }

    #[test]
    fn test_failed_save_keeps_changes() {
        let mut gateway = gateway(MemoryPersistence {
            fail_writes: true,
            ..MemoryPersistence::default()
        });

        let result = gateway.place_order("Ravi", &[request(2, 1)]);

        assert!(matches!(result, Err(StoreError::Persistence { .. })));
        assert_eq!(gateway.store().orders().len(), 1);
        assert_eq!(gateway.store().product(2).unwrap().stock(), 9);
    }

    #[test]
    fn test_add_student_and_teacher() {
        let mut gateway = gateway(MemoryPersistence::default());

        let marks: IndexMap<String, Decimal> =
            vec![("Math".to_string(), dec!(80))].into_iter().collect();
        assert_eq!(gateway.add_student(" Asha ", 15, "10", marks).unwrap(), 1);
        assert_eq!(gateway.add_student("Kiran", 14, "9", IndexMap::new()).unwrap(), 2);
        assert_eq!(gateway.add_teacher("Mr. Rao", "Math", dec!(50000)).unwrap(), 1);

        let store = gateway.store();
        assert_eq!(store.students()[0].info.name, "Asha");
        assert_eq!(store.students()[1].average(), Decimal::ZERO);
        assert_eq!(store.teachers()[0].subject, "Math");
        assert_eq!(
            *gateway.persistence.saved.borrow(),
            vec!["students", "students", "teachers"]
        );
    }

    /// Ids loaded from the files can leave no room for another one
    #[test]
    fn test_exhausted_ids_are_an_error() {
        let mut gateway = gateway(MemoryPersistence::default());
        gateway
            .store
            .add_order(Order::new(u32::MAX, "Ravi", vec![]))
            .unwrap();
        gateway.store.add_teacher(Teacher {
            id: u32::MAX,
            info: PersonalInfo::new("Mr. Rao", None),
            subject: "Math".to_string(),
            salary: dec!(50000),
        });

        assert!(matches!(
            gateway.place_order("Ravi", &[request(2, 1)]),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            gateway.add_teacher("Ms. Iyer", "Science", dec!(48000)),
            Err(StoreError::Validation(_))
        ));

        assert_eq!(gateway.store().product(2).unwrap().stock(), 10);
        assert_eq!(gateway.store().orders().len(), 1);
        assert_eq!(gateway.store().teachers().len(), 1);
        assert!(gateway.persistence.saved.borrow().is_empty());
    }

    #[test]
    fn test_add_person_validation() {
        let mut gateway = gateway(MemoryPersistence::default());

        assert!(gateway.add_teacher("", "Math", dec!(1)).is_err());
        assert!(gateway.add_teacher("Mr. Rao", "Math", dec!(-1)).is_err());
        let marks: IndexMap<String, Decimal> =
            vec![("Math".to_string(), dec!(-5))].into_iter().collect();
        assert!(gateway.add_student("Asha", 15, "10", marks).is_err());

        assert!(gateway.store().teachers().is_empty());
        assert!(gateway.store().students().is_empty());
        assert!(gateway.persistence.saved.borrow().is_empty());
    }
}

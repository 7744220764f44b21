use std::fmt::Display;

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::{
    aggregate,
    error::StoreError,
    records::{
        OrderId, OrderItemRecord, OrderRecord, PersonId, ProductId, ProductRecord, Quantity,
        StudentRecord, TeacherRecord,
    },
};

/// Anything stored under a unique numeric id
pub trait Identified {
    fn id(&self) -> u32;
}

/// A product on sale
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    /// Units left, only changed through `take_stock`
    stock: Quantity,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        stock: Quantity,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            price,
            stock,
        }
    }

    /// Get the units left in stock
    pub fn stock(&self) -> Quantity {
        self.stock
    }

    /// Checks that `quantity` units can be taken without touching the stock
    pub fn check_stock(&self, quantity: Quantity) -> Result<(), StoreError> {
        if quantity > self.stock {
            return Err(StoreError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Removes `quantity` units from the stock
    /// Returns an `Error` and leaves the stock as is if there are not enough units
    pub fn take_stock(&mut self, quantity: Quantity) -> Result<(), StoreError> {
        self.check_stock(quantity)?;
        self.stock -= quantity;
        Ok(())
    }
}

impl Identified for Product {
    fn id(&self) -> u32 {
        self.id
    }
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product::new(
            record.id,
            record.name,
            record.category,
            record.price,
            record.stock,
        )
    }
}

impl From<&Product> for ProductRecord {
    fn from(product: &Product) -> Self {
        ProductRecord {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            stock: product.stock,
        }
    }
}

/// A product and how many units of it were ordered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A placed order. Totals are never stored, the store computes them from the
/// current product prices
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    order_id: OrderId,
    customer: String,
    items: Vec<OrderItem>,
}

impl Order {
    pub fn new(order_id: OrderId, customer: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            order_id,
            customer: customer.into(),
            items,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Name of the customer owning the order
    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
}

impl Identified for Order {
    fn id(&self) -> u32 {
        self.order_id
    }
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        OrderRecord {
            order_id: order.order_id,
            customer: order.customer.clone(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemRecord {
                    product_id: item.product_id,
                    qty: item.quantity,
                })
                .collect(),
        }
    }
}

/// A customer and its order history
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    name: String,
    /// Ids of the owned orders, in the order they were placed
    orders: Vec<OrderId>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            orders: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn orders(&self) -> &[OrderId] {
        &self.orders
    }

    /// Only the store calls this, so the history always matches the order list
    pub(crate) fn add_order(&mut self, order_id: OrderId) {
        self.orders.push(order_id);
    }
}

/// What students and teachers have in common
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalInfo {
    pub name: String,
    /// Teachers files carry no age
    pub age: Option<u32>,
}

impl PersonalInfo {
    pub fn new(name: impl Into<String>, age: Option<u32>) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

impl Display for PersonalInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.age {
            Some(age) => write!(f, "Name: {}, Age: {}", self.name, age),
            None => write!(f, "Name: {}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: PersonId,
    pub info: PersonalInfo,
    pub grade: String,
    pub marks: IndexMap<String, Decimal>,
}

impl Student {
    /// Mean of all the scores, 0 when the student has no marks
    pub fn average(&self) -> Decimal {
        let total: Decimal = self.marks.values().copied().sum();
        aggregate::mean(total, self.marks.len())
    }

    /// The subject with the best score, first one wins on ties
    pub fn highest_subject(&self) -> Option<&str> {
        aggregate::arg_max(self.marks.iter(), |(_, score)| **score)
            .map(|(subject, _)| subject.as_str())
    }
}

impl Identified for Student {
    fn id(&self) -> u32 {
        self.id
    }
}

impl From<StudentRecord> for Student {
    fn from(record: StudentRecord) -> Self {
        Student {
            id: record.id,
            info: PersonalInfo::new(record.name, Some(record.age)),
            grade: record.grade,
            marks: record.marks,
        }
    }
}

impl From<&Student> for StudentRecord {
    fn from(student: &Student) -> Self {
        StudentRecord {
            id: student.id,
            name: student.info.name.clone(),
            age: student.info.age.unwrap_or_default(),
            grade: student.grade.clone(),
            marks: student.marks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Teacher {
    pub id: PersonId,
    pub info: PersonalInfo,
    pub subject: String,
    pub salary: Decimal,
}

impl Teacher {
    /// Subjects are compared ignoring case
    pub fn teaches(&self, subject: &str) -> bool {
        self.subject.to_lowercase() == subject.to_lowercase()
    }
}

impl Identified for Teacher {
    fn id(&self) -> u32 {
        self.id
    }
}

impl From<TeacherRecord> for Teacher {
    fn from(record: TeacherRecord) -> Self {
        Teacher {
            id: record.id,
            info: PersonalInfo::new(record.name, None),
            subject: record.subject,
            salary: record.salary,
        }
    }
}

impl From<&Teacher> for TeacherRecord {
    fn from(teacher: &Teacher) -> Self {
        TeacherRecord {
            id: teacher.id,
            name: teacher.info.name.clone(),
            subject: teacher.subject.clone(),
            salary: teacher.salary,
        }
    }
}

/// Either kind of person known to the school
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Person<'a> {
    Student(&'a Student),
    Teacher(&'a Teacher),
}

impl<'a> Person<'a> {
    pub fn id(&self) -> PersonId {
        match self {
            Person::Student(student) => student.id,
            Person::Teacher(teacher) => teacher.id,
        }
    }

    pub fn info(&self) -> &'a PersonalInfo {
        match self {
            Person::Student(student) => &student.info,
            Person::Teacher(teacher) => &teacher.info,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn student(marks: &[(&str, Decimal)]) -> Student {
        Student {
            id: 1,
            info: PersonalInfo::new("Asha", Some(15)),
            grade: "10".to_string(),
            marks: marks
                .iter()
                .map(|(subject, score)| (subject.to_string(), *score))
                .collect(),
        }
    }

    /*  Stock scenario:
            1) Product has 2 units
            2) Taking 3 fails and nothing changes
            3) Taking 2 empties the stock
    */
    #[test]
    fn test_take_stock() {
        let mut product = Product::new(1, "Laptop", "Electronics", dec!(10), 2);

        assert_eq!(
            product.take_stock(3),
            Err(StoreError::InsufficientStock {
                product_id: 1,
                available: 2,
                requested: 3
            })
        );
        assert_eq!(product.stock(), 2);

        assert!(product.take_stock(2).is_ok());
        assert_eq!(product.stock(), 0);
        assert!(product.take_stock(1).is_err());
        assert_eq!(product.stock(), 0);
    }

    #[test]
    fn test_student_average() {
        assert_eq!(
            student(&[("Math", dec!(80)), ("Science", dec!(90))]).average(),
            dec!(85)
        );
        // No marks means an average of zero rather than a division error
        assert_eq!(student(&[]).average(), Decimal::ZERO);
    }

    #[test]
    fn test_highest_subject_first_wins() {
        let s = student(&[("Math", dec!(90)), ("Science", dec!(95)), ("Art", dec!(95))]);
        assert_eq!(s.highest_subject(), Some("Science"));
        assert_eq!(student(&[]).highest_subject(), None);
    }

    #[test]
    fn test_teacher_subject_ignores_case() {
        let teacher = Teacher::from(TeacherRecord {
            id: 3,
            name: "Mr. Rao".to_string(),
            subject: "Mathematics".to_string(),
            salary: dec!(50000),
        });
        assert!(teacher.teaches("mathematics"));
        assert!(teacher.teaches("MATHEMATICS"));
        assert!(!teacher.teaches("Math"));
        assert_eq!(teacher.info.age, None);
    }

    #[test]
    fn test_person_view() {
        let s = student(&[]);
        let person = Person::Student(&s);
        assert_eq!(person.id(), 1);
        assert_eq!(person.info().to_string(), "Name: Asha, Age: 15");
    }
}

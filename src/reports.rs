//! Read-only reports over the entity store.
//!
//! Every report is a plain value so the console (or anything else) decides how
//! to show it. Building a report never changes the store, so asking twice
//! without a mutation in between gives equal results.

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::{
    aggregate,
    entities::{Order, Person, Product},
    records::{OrderId, PersonId, ProductId, Quantity},
    store::EntityStore,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSpend {
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport {
    pub total_revenue: Decimal,
    pub revenue_by_category: IndexMap<String, Decimal>,
    /// None when there are no customers
    pub top_customer: Option<CustomerSpend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockAlert {
    pub product_id: ProductId,
    pub name: String,
    pub stock: Quantity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReport {
    pub threshold: Quantity,
    pub low_stock: Vec<StockAlert>,
    pub average_price_by_category: IndexMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        ProductSummary {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
        }
    }
}

/// Highlights shown along with the product list
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogOverview {
    pub most_expensive: Option<ProductSummary>,
    /// Product with the most units ordered and that amount
    pub most_ordered: Option<(ProductSummary, u64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub customer: String,
    /// (product, quantity) pairs
    pub items: Vec<(ProductSummary, Quantity)>,
    pub total: Decimal,
    /// Revenue of this order and every order before it
    pub running_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerHistory {
    pub name: String,
    pub orders: Vec<OrderLine>,
    pub total_spent: Decimal,
}

/// Who teaches a student's best subject
#[derive(Debug, Clone, PartialEq)]
pub enum TeacherMatch {
    Teacher(String),
    NoTeacherFound,
    NoSubjectsFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentTeacherRow {
    pub student: String,
    pub highest_subject: Option<String>,
    pub teacher: TeacherMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentTeacherReport {
    pub rows: Vec<StudentTeacherRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub students_per_grade: IndexMap<String, usize>,
    pub average_mark_per_subject: IndexMap<String, Decimal>,
    pub total_teacher_salary: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentScore {
    pub id: PersonId,
    pub name: String,
    pub average: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherPay {
    pub id: PersonId,
    pub name: String,
    pub salary: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub top_student: Option<StudentScore>,
    pub highest_paid_teacher: Option<TeacherPay>,
    /// 0 when there are no teachers
    pub average_teacher_salary: Decimal,
    pub student_count: usize,
    pub teacher_count: usize,
}

/// Builds reports from a borrowed store
pub struct ReportBuilder<'a> {
    store: &'a EntityStore,
    low_stock_threshold: Quantity,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(store: &'a EntityStore, low_stock_threshold: Quantity) -> Self {
        Self {
            store,
            low_stock_threshold,
        }
    }

    /// Every ordered item with its product, skipping items whose product is gone
    fn ordered_items(&self) -> impl Iterator<Item = (&'a Product, Quantity)> + 'a {
        let store = self.store;
        store.orders().iter().flat_map(move |order| {
            order.items().iter().filter_map(move |item| {
                store
                    .product(item.product_id)
                    .map(|product| (product, item.quantity))
            })
        })
    }

    /// Total revenue, revenue per category and the biggest spender
    pub fn sales(&self) -> SalesReport {
        let total_revenue: Decimal = self
            .store
            .orders()
            .iter()
            .map(|order| self.store.order_total(order))
            .sum();

        let revenue_by_category = aggregate::group_sum(
            self.ordered_items(),
            |(product, _)| product.category.clone(),
            |(product, quantity)| product.price * Decimal::from(*quantity),
        );

        let top_customer = aggregate::arg_max(
            self.store.customers().map(|customer| CustomerSpend {
                name: customer.name().to_string(),
                total: self.store.customer_total(customer),
            }),
            |spend| spend.total,
        );

        SalesReport {
            total_revenue,
            revenue_by_category,
            top_customer,
        }
    }

    /// Low stock alerts and average price per category
    pub fn inventory(&self) -> InventoryReport {
        let low_stock: Vec<StockAlert> = self
            .store
            .products()
            .iter()
            .filter(|product| product.stock() < self.low_stock_threshold)
            .map(|product| StockAlert {
                product_id: product.id,
                name: product.name.clone(),
                stock: product.stock(),
            })
            .collect();

        let average_price_by_category = aggregate::group_mean(
            self.store.products(),
            |product| product.category.clone(),
            |product| product.price,
        );

        InventoryReport {
            threshold: self.low_stock_threshold,
            low_stock,
            average_price_by_category,
        }
    }

    /// Most expensive and most ordered products
    pub fn catalog(&self) -> CatalogOverview {
        let most_expensive =
            aggregate::arg_max(self.store.products(), |product| product.price).map(ProductSummary::from);

        let most_ordered = aggregate::top_by_quantity(
            self.ordered_items(),
            |(product, _)| product.id,
            |(_, quantity)| u64::from(*quantity),
        )
        .and_then(|(product_id, total)| {
            self.store
                .product(product_id)
                .map(|product| (ProductSummary::from(product), total))
        });

        CatalogOverview {
            most_expensive,
            most_ordered,
        }
    }

    fn order_lines<'o>(&self, orders: impl IntoIterator<Item = &'o Order>) -> Vec<OrderLine> {
        let orders: Vec<&Order> = orders.into_iter().collect();
        let running = aggregate::running_totals(&orders, |order| self.store.order_total(order));

        orders
            .into_iter()
            .zip(running)
            .map(|(order, running_total)| OrderLine {
                order_id: order.order_id(),
                customer: order.customer().to_string(),
                items: order
                    .items()
                    .iter()
                    .filter_map(|item| {
                        self.store
                            .product(item.product_id)
                            .map(|product| (ProductSummary::from(product), item.quantity))
                    })
                    .collect(),
                total: self.store.order_total(order),
                running_total,
            })
            .collect()
    }

    /// Every order in the order they were placed
    pub fn order_ledger(&self) -> Vec<OrderLine> {
        self.order_lines(self.store.orders())
    }

    /// Orders of one customer, None if nobody goes by that name
    pub fn customer_history(&self, name: &str) -> Option<CustomerHistory> {
        let customer = self.store.customer(name)?;
        Some(CustomerHistory {
            name: customer.name().to_string(),
            orders: self.order_lines(self.store.customer_orders(name)),
            total_spent: self.store.customer_total(customer),
        })
    }

    /// Each student's best subject and a teacher for it
    pub fn student_teacher(&self) -> StudentTeacherReport {
        let rows = self
            .store
            .students()
            .iter()
            .map(|student| {
                let highest_subject = student.highest_subject();
                let teacher = match highest_subject {
                    None => TeacherMatch::NoSubjectsFound,
                    Some(subject) => self
                        .store
                        .teachers()
                        .iter()
                        .find(|teacher| teacher.teaches(subject))
                        .map_or(TeacherMatch::NoTeacherFound, |teacher| {
                            TeacherMatch::Teacher(teacher.info.name.clone())
                        }),
                };
                StudentTeacherRow {
                    student: student.info.name.clone(),
                    highest_subject: highest_subject.map(str::to_string),
                    teacher,
                }
            })
            .collect();

        StudentTeacherReport { rows }
    }

    /// Students per grade, average mark per subject and the salary bill
    pub fn summary(&self) -> SummaryReport {
        let students_per_grade = aggregate::group_reduce(
            self.store.students(),
            |student| student.grade.clone(),
            |count, _| count + 1,
            0usize,
        );

        let average_mark_per_subject = aggregate::group_mean(
            self.store
                .students()
                .iter()
                .flat_map(|student| student.marks.iter()),
            |(subject, _)| subject.to_string(),
            |(_, score)| **score,
        );

        SummaryReport {
            students_per_grade,
            average_mark_per_subject,
            total_teacher_salary: self.total_salary(),
        }
    }

    /// Top student, best paid teacher and head counts
    pub fn statistics(&self) -> StatisticsReport {
        let students = self.store.students();
        let teachers = self.store.teachers();

        let top_student =
            aggregate::arg_max(students, |student| student.average()).map(|student| StudentScore {
                id: student.id,
                name: student.info.name.clone(),
                average: student.average(),
            });

        let highest_paid_teacher =
            aggregate::arg_max(teachers, |teacher| teacher.salary).map(|teacher| TeacherPay {
                id: teacher.id,
                name: teacher.info.name.clone(),
                salary: teacher.salary,
            });

        let (student_count, teacher_count) =
            self.store
                .people()
                .fold((0, 0), |(students, teachers), person| match person {
                    Person::Student(_) => (students + 1, teachers),
                    Person::Teacher(_) => (students, teachers + 1),
                });

        StatisticsReport {
            top_student,
            highest_paid_teacher,
            average_teacher_salary: aggregate::mean(self.total_salary(), teacher_count),
            student_count,
            teacher_count,
        }
    }

    fn total_salary(&self) -> Decimal {
        self.store.teachers().iter().map(|teacher| teacher.salary).sum()
    }
}

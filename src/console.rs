//! Text menus and report rendering.
//!
//! The console is generic over its input and output so a whole session can be
//! scripted. Data errors are printed and the menu carries on; only I/O errors
//! on the console itself end a session.

use std::{
    fmt::{self, Display},
    io::{self, BufRead, Write},
    str::FromStr,
};

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::{
    entities::{Person, Product},
    error::StoreError,
    gateway::{MutationGateway, OrderOutcome, OrderRequest},
    persistence::Persistence,
    records::{ProductId, Quantity},
    reports::{
        CatalogOverview, CustomerHistory, InventoryReport, OrderLine, ReportBuilder, SalesReport,
        StatisticsReport, StudentTeacherReport, SummaryReport, TeacherMatch,
    },
};

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Shows `message` and reads one line without its line ending.
    /// Returns None once the input is exhausted
    pub fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    pub fn show(&mut self, item: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", item)
    }

    fn report_error(&mut self, err: &StoreError) -> io::Result<()> {
        self.show(format!("Error: {}", err))
    }
}

/// Parses a number typed by the user
pub fn parse_number<T: FromStr>(field: &str, input: &str) -> Result<T, StoreError> {
    input.trim().parse().map_err(|_| {
        StoreError::validation(format!("{} must be a number, got '{}'", field, input.trim()))
    })
}

const SHOP_MENU: &str = "
=== E-COMMERCE ORDER MANAGEMENT SYSTEM ===
1. View Products
2. Place New Order
3. View All Orders
4. Generate Sales Report
5. Generate Inventory Report
6. View Customer Orders
7. Exit";

const SCHOOL_MENU: &str = "
=== SCHOOL MANAGEMENT SYSTEM ===
1. View All Students
2. View All Teachers
3. Add New Student
4. Add New Teacher
5. Generate Student-Teacher Report
6. Generate Summary Report
7. Show Statistics
8. Exit";

/// Runs the order manager until the user exits or the input ends
pub fn run_shop<R, W, P>(
    console: &mut Console<R, W>,
    gateway: &mut MutationGateway<P>,
    low_stock_threshold: Quantity,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    P: Persistence,
{
    loop {
        console.show(SHOP_MENU)?;
        let choice = match console.prompt("Enter your choice (1-7): ")? {
            Some(choice) => choice,
            None => return Ok(()),
        };

        match choice.trim() {
            "1" => {
                show_products(console, gateway.store().products())?;
                console.show(ReportBuilder::new(gateway.store(), low_stock_threshold).catalog())?;
            }
            "2" => place_new_order(console, gateway)?,
            "3" => {
                console.show("\n=== ALL ORDERS ===")?;
                let ledger = ReportBuilder::new(gateway.store(), low_stock_threshold).order_ledger();
                if ledger.is_empty() {
                    console.show("No orders found.")?;
                }
                for line in ledger {
                    console.show(line)?;
                }
            }
            "4" => console.show(ReportBuilder::new(gateway.store(), low_stock_threshold).sales())?,
            "5" => {
                console.show(ReportBuilder::new(gateway.store(), low_stock_threshold).inventory())?
            }
            "6" => {
                let name = match console.prompt("Enter customer name: ")? {
                    Some(name) => name,
                    None => return Ok(()),
                };
                match ReportBuilder::new(gateway.store(), low_stock_threshold)
                    .customer_history(name.trim())
                {
                    Some(history) => console.show(history)?,
                    None => console.show(format!("No orders found for {}.", name.trim()))?,
                }
            }
            "7" => {
                console.show("Thank you for using the E-Commerce Order Management System!")?;
                return Ok(());
            }
            _ => console.show("Invalid choice. Please try again.")?,
        }
    }
}

fn show_products<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    products: &[Product],
) -> io::Result<()> {
    console.show("\n=== ALL PRODUCTS ===")?;
    for product in products {
        console.show(format!(
            "ID: {}, Name: {}, Category: {}, Price: ₹{}, Stock: {}",
            product.id,
            product.name,
            product.category,
            product.price,
            product.stock()
        ))?;
    }
    Ok(())
}

/// Collects items until the user enters 0, then asks for confirmation.
/// Items are checked against the stock as they are entered, the gateway
/// checks them again when the order is placed
fn place_new_order<R, W, P>(
    console: &mut Console<R, W>,
    gateway: &mut MutationGateway<P>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    P: Persistence,
{
    console.show("\n=== PLACE NEW ORDER ===")?;
    let customer = match console.prompt("Enter customer name: ")? {
        Some(customer) => customer,
        None => return Ok(()),
    };

    let mut items: Vec<OrderRequest> = Vec::new();
    loop {
        show_products(console, gateway.store().products())?;
        let input = match console.prompt("Enter product ID to add to order (0 to finish): ")? {
            Some(input) => input,
            None => break,
        };
        let product_id: ProductId = match parse_number("Product ID", &input) {
            Ok(0) => break,
            Ok(product_id) => product_id,
            Err(err) => {
                console.report_error(&err)?;
                continue;
            }
        };

        let name = match gateway.store().product(product_id) {
            Some(product) => product.name.clone(),
            None => {
                console.show("Invalid product ID.")?;
                continue;
            }
        };

        let input = match console.prompt(&format!("Enter quantity for {}: ", name))? {
            Some(input) => input,
            None => break,
        };
        let quantity: Quantity = match parse_number("Quantity", &input) {
            Ok(0) => {
                console.show("Quantity must be positive.")?;
                continue;
            }
            Ok(quantity) => quantity,
            Err(err) => {
                console.report_error(&err)?;
                continue;
            }
        };

        let pending: Quantity = items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum();
        let requested = pending
            .checked_add(quantity)
            .ok_or_else(|| {
                StoreError::validation(format!("Quantity {} is too large", input.trim()))
            })
            .and_then(|requested| gateway.store().check_availability(product_id, requested));
        if let Err(err) = requested {
            console.report_error(&err)?;
            continue;
        }

        items.push(OrderRequest {
            product_id,
            quantity,
        });
        console.show(format!("Added {} x {} to order.", quantity, name))?;
    }

    if items.is_empty() {
        return console.show("Order cancelled. No items added.");
    }

    let total: Decimal = items
        .iter()
        .filter_map(|item| {
            gateway
                .store()
                .product(item.product_id)
                .map(|product| product.price * Decimal::from(item.quantity))
        })
        .sum();
    console.show(format!("\nOrder Summary: Total: ₹{}", total))?;

    let confirm = console.prompt("Confirm order? (y/n): ")?.unwrap_or_default();
    if !confirm.trim().eq_ignore_ascii_case("y") {
        return console.show("Order cancelled.");
    }

    match gateway.place_order(&customer, &items) {
        Ok(outcome) => console.show(outcome),
        Err(err) => console.report_error(&err),
    }
}

/// Runs the school record manager until the user exits or the input ends
pub fn run_school<R, W, P>(
    console: &mut Console<R, W>,
    gateway: &mut MutationGateway<P>,
    low_stock_threshold: Quantity,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    P: Persistence,
{
    loop {
        console.show(SCHOOL_MENU)?;
        let choice = match console.prompt("Enter your choice (1-8): ")? {
            Some(choice) => choice,
            None => return Ok(()),
        };

        match choice.trim() {
            "1" => show_people(
                console,
                "\n=== ALL STUDENTS ===",
                gateway.store().students().iter().map(Person::Student),
            )?,
            "2" => show_people(
                console,
                "\n=== ALL TEACHERS ===",
                gateway.store().teachers().iter().map(Person::Teacher),
            )?,
            "3" => add_new_student(console, gateway)?,
            "4" => add_new_teacher(console, gateway)?,
            "5" => {
                let reports = ReportBuilder::new(gateway.store(), low_stock_threshold);
                console.show(reports.student_teacher())?
            }
            "6" => {
                console.show(ReportBuilder::new(gateway.store(), low_stock_threshold).summary())?
            }
            "7" => {
                let reports = ReportBuilder::new(gateway.store(), low_stock_threshold);
                console.show(reports.statistics())?
            }
            "8" => {
                console.show("Thank you for using the School Management System!")?;
                return Ok(());
            }
            _ => console.show("Invalid choice. Please try again.")?,
        }
    }
}


/// One line of the student or teacher list
fn describe(person: Person<'_>) -> String {
    match person {
        Person::Student(student) => format!(
            "ID: {}, {}, Grade: {}, Average: {:.2}",
            person.id(),
            person.info(),
            student.grade,
            student.average()
        ),
        Person::Teacher(teacher) => format!(
            "ID: {}, {}, Subject: {}, Salary: ₹{}",
            person.id(),
            person.info(),
            teacher.subject,
            teacher.salary
        ),
    }
}

fn show_people<'a, R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    title: &str,
    people: impl Iterator<Item = Person<'a>>,
) -> io::Result<()> {
    console.show(title)?;
    for person in people {
        console.show(describe(person))?;
    }
    Ok(())
}

fn add_new_student<R, W, P>(
    console: &mut Console<R, W>,
    gateway: &mut MutationGateway<P>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    P: Persistence,
{
    console.show("\n=== ADD NEW STUDENT ===")?;
    let name = match console.prompt("Enter student name: ")? {
        Some(name) => name,
        None => return Ok(()),
    };
    let age: u32 = match console.prompt("Enter student age: ")? {
        Some(input) => match parse_number("Age", &input) {
            Ok(age) => age,
            Err(err) => return console.report_error(&err),
        },
        None => return Ok(()),
    };
    let grade = match console.prompt("Enter student grade: ")? {
        Some(grade) => grade,
        None => return Ok(()),
    };

    let mut marks: IndexMap<String, Decimal> = IndexMap::new();
    console.show("Enter marks for each subject (leave blank to finish):")?;
    loop {
        let subject = match console.prompt("Subject: ")? {
            Some(subject) if !subject.trim().is_empty() => subject.trim().to_string(),
            _ => break,
        };
        let mark: Decimal = match console.prompt(&format!("Mark for {}: ", subject))? {
            Some(input) => match parse_number("Mark", &input) {
                Ok(mark) => mark,
                Err(err) => return console.report_error(&err),
            },
            None => return Ok(()),
        };
        marks.insert(subject, mark);
    }

    match gateway.add_student(&name, age, &grade, marks) {
        Ok(id) => console.show(format!(
            "Student {} added successfully with ID {}!",
            name.trim(),
            id
        )),
        Err(err) => console.report_error(&err),
    }
}

fn add_new_teacher<R, W, P>(
    console: &mut Console<R, W>,
    gateway: &mut MutationGateway<P>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    P: Persistence,
{
    console.show("\n=== ADD NEW TEACHER ===")?;
    let name = match console.prompt("Enter teacher name: ")? {
        Some(name) => name,
        None => return Ok(()),
    };
    let subject = match console.prompt("Enter subject: ")? {
        Some(subject) => subject,
        None => return Ok(()),
    };
    let salary: Decimal = match console.prompt("Enter salary: ")? {
        Some(input) => match parse_number("Salary", &input) {
            Ok(salary) => salary,
            Err(err) => return console.report_error(&err),
        },
        None => return Ok(()),
    };

    match gateway.add_teacher(&name, &subject, salary) {
        Ok(id) => console.show(format!(
            "Teacher {} added successfully with ID {}!",
            name.trim(),
            id
        )),
        Err(err) => console.report_error(&err),
    }
}

impl Display for OrderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.rejected {
            writeln!(
                f,
                "Product {} x {} not added: {}",
                item.product_id, item.quantity, item.reason
            )?;
        }
        match &self.placed {
            Some(placed) => write!(
                f,
                "Order #{} placed successfully! Total: ₹{}",
                placed.order_id, placed.total
            ),
            None => write!(f, "Order not placed, none of the items could be fulfilled."),
        }
    }
}

impl Display for CatalogOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(product) = &self.most_expensive {
            writeln!(f, "\nMost Expensive Product: {} - ₹{}", product.name, product.price)?;
        }
        if let Some((product, quantity)) = &self.most_ordered {
            write!(f, "Most Ordered Product: {} - {} units", product.name, quantity)?;
        }
        Ok(())
    }
}

impl Display for OrderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nOrder ID: {}, Customer: {}", self.order_id, self.customer)?;
        writeln!(f, "Items:")?;
        for (product, quantity) in &self.items {
            writeln!(
                f,
                "  - {} (Qty: {}, Price: ₹{})",
                product.name, quantity, product.price
            )?;
        }
        write!(
            f,
            "Total: ₹{} (running total: ₹{})",
            self.total, self.running_total
        )
    }
}

impl Display for CustomerHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\n=== ORDERS OF {} ===",
            self.name.to_uppercase()
        )?;
        for line in &self.orders {
            writeln!(f, "{}", line)?;
        }
        write!(f, "\nTotal Spent: ₹{}", self.total_spent)
    }
}

impl Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== SALES REPORT ===")?;
        writeln!(f, "Total Revenue: ₹{}", self.total_revenue)?;
        writeln!(f, "\nRevenue by Category:")?;
        for (category, revenue) in &self.revenue_by_category {
            writeln!(f, "{}: ₹{}", category, revenue)?;
        }
        if let Some(customer) = &self.top_customer {
            write!(f, "\nTop Customer: {} - ₹{}", customer.name, customer.total)?;
        }
        Ok(())
    }
}

impl Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== INVENTORY REPORT ===")?;
        if self.low_stock.is_empty() {
            writeln!(f, "No products with low stock.")?;
        } else {
            writeln!(f, "Low Stock Alert (stock < {}):", self.threshold)?;
            for alert in &self.low_stock {
                writeln!(f, "{}: {} remaining", alert.name, alert.stock)?;
            }
        }
        write!(f, "\nAverage Price by Category:")?;
        for (category, price) in &self.average_price_by_category {
            write!(f, "\n{}: ₹{:.2}", category, price)?;
        }
        Ok(())
    }
}

impl Display for TeacherMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeacherMatch::Teacher(name) => write!(f, "{}", name),
            TeacherMatch::NoTeacherFound => write!(f, "No teacher found"),
            TeacherMatch::NoSubjectsFound => write!(f, "No subjects found"),
        }
    }
}

impl Display for StudentTeacherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n=== STUDENT-TEACHER REPORT ===")?;
        if self.rows.is_empty() {
            return write!(f, "\nNo data available for report.");
        }
        for row in &self.rows {
            write!(
                f,
                "\n{} (Highest Subject: {}) - Class Teacher: {}",
                row.student,
                row.highest_subject.as_deref().unwrap_or("None"),
                row.teacher
            )?;
        }
        Ok(())
    }
}

impl Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== SUMMARY REPORT ===")?;
        writeln!(f, "\nStudents per Grade:")?;
        for (grade, count) in &self.students_per_grade {
            writeln!(f, "Grade {}: {} students", grade, count)?;
        }
        writeln!(f, "\nAverage Marks per Subject:")?;
        for (subject, average) in &self.average_mark_per_subject {
            writeln!(f, "{}: {:.2}", subject, average)?;
        }
        write!(
            f,
            "\nTotal Salary Spent on Teachers: ₹{:.2}",
            self.total_teacher_salary
        )
    }
}

impl Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== STATISTICS ===")?;
        if let Some(student) = &self.top_student {
            writeln!(f, "Top Student: {} (Average: {:.2})", student.name, student.average)?;
        }
        if let Some(teacher) = &self.highest_paid_teacher {
            writeln!(
                f,
                "Highest Paid Teacher: {} (Salary: ₹{:.2})",
                teacher.name, teacher.salary
            )?;
        }
        writeln!(f, "Average Teacher Salary: ₹{:.2}", self.average_teacher_salary)?;
        writeln!(f, "Total Students: {}", self.student_count)?;
        write!(f, "Total Teachers: {}", self.teacher_count)
    }
}

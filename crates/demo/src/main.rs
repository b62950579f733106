use anyhow::Context;

use libris_catalog::{BookId, Library, LibraryPolicy, UserId};

const CATALOG: [(&str, &str, &str, i32); 4] = [
    ("El Quijote", "Miguel de Cervantes", "978-84-376-0494-7", 863),
    ("Cien Años de Soledad", "Gabriel García Márquez", "978-84-376-0495-4", 471),
    ("Go Programming", "Alan Donovan", "978-0-13-419044-0", 380),
    ("Clean Code", "Robert Martin", "978-0-13-235088-4", 464),
];

const PATRONS: [(&str, &str, &str); 4] = [
    ("Carlos", "carlos@gmail.com", "+56 999 999 999"),
    ("Maria", "maria@gmail.com", "+56 999 999 999"),
    ("Juan", "juan@gmail.com", "+56 999 999 999"),
    ("Pedro", "pedro@gmail.com", "+56 999 999 999"),
];

fn main() -> anyhow::Result<()> {
    libris_observability::init();

    let policy = LibraryPolicy::from_env();
    tracing::info!(loan_period_days = policy.loan_period_days, "starting library demo");

    let mut library = Library::with_policy("Central Library", "Main Avenue 123", policy);
    println!("Library created: {}", library.name());

    println!("\nAdding books...");
    let mut books: Vec<BookId> = Vec::new();
    for (title, author, isbn, pages) in CATALOG {
        match library.add_book(title, author, isbn, pages) {
            Ok(book) => {
                println!("  added {}", book.info());
                books.push(book.id_typed());
            }
            Err(err) => println!("  could not add book: {err}"),
        }
    }

    println!("\nRegistering users...");
    let mut users: Vec<UserId> = Vec::new();
    for (name, email, phone) in PATRONS {
        match library.register_user(name, email, phone) {
            Ok(user) => {
                println!("  registered {}", user.summary());
                users.push(user.id_typed());
            }
            Err(err) => println!("  could not register user: {err}"),
        }
    }

    println!("\nIssuing loans...");
    for (book_idx, user_idx) in [(0, 0), (2, 1), (1, 2)] {
        let (Some(&book_id), Some(&user_id)) = (books.get(book_idx), users.get(user_idx)) else {
            continue;
        };
        match library.issue_loan(book_id, user_id) {
            Ok(loan) => println!("  loan {} due {}", loan.id_typed(), loan.due_at().date_naive()),
            Err(err) => println!("  could not issue loan: {err}"),
        }
    }

    println!("\nAvailable books:");
    let available = library.list_available();
    if available.is_empty() {
        println!("  No books available");
    }
    for line in available {
        println!("  {line}");
    }

    println!("\nReturning a book...");
    let first = *books.first().context("catalog is empty")?;
    match library.return_loan(first) {
        Ok(_) => println!("  book returned"),
        Err(err) => println!("  could not return book: {err}"),
    }

    println!("\n{}", library.statistics());

    println!("\nBorrowing directly through a live handle...");
    let last = *books.last().context("catalog is empty")?;
    let book = library
        .find_book_mut(last)
        .with_context(|| format!("book {last} disappeared"))?;
    println!("  before: {}", book.info());
    match book.borrow() {
        Ok(()) => println!("  after: {}", book.info()),
        Err(err) => println!("  could not borrow: {err}"),
    }
    let book = library
        .find_book(last)
        .with_context(|| format!("book {last} disappeared"))?;
    println!(
        "  lendable: {}, large: {}",
        book.is_lendable(),
        library.is_large(book)
    );

    tracing::info!(events = library.journal().len(), "demo finished");
    Ok(())
}

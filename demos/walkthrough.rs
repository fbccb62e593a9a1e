//! Walk through legal owner/view/token usage, then deliberately keep a view
//! alive past its owner's scope. The last step aborts the process.
//!
//! Run with `cargo run --example walkthrough`.

use runtime_borrows::{ExclusiveView, Owner, SharedView};
use std::fmt;

struct Example {
    id: u32,
}

impl Example {
    fn new(id: u32) -> Self {
        println!("Example constructor {id}");
        Self { id }
    }

    fn change(&mut self) {
        println!("Example mutating {}", self.id);
    }
}

impl Drop for Example {
    fn drop(&mut self) {
        println!("Example destructor {}", self.id);
    }
}

impl fmt::Display for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Example {}", self.id)
    }
}

fn handle_borrowed_mut(mut another: ExclusiveView<Example>) {
    println!("Borrowed_mut: {}", another.get());
    another.get_mut().change();
}

fn handle_borrowed(another: SharedView<Example>) {
    println!("Borrowed: {}", another.get());
}

fn handle_borrowed_nested(another: SharedView<Example>) {
    handle_borrowed(another.clone());
}

fn handle_owned(another: Owner<Example>) {
    println!("Owned: {}", another.get());
    handle_borrowed(another.borrow());
    println!("Still owned: {}", another.get());
}

fn handle_delegated(mut original: Owner<Example>) {
    let token = original.delegate();
    println!("Delegated: {}", token.get());
    handle_borrowed(token.borrow());
    drop(token);
    println!("Token dropped; owner still in scope");
}

struct MoreStuff {
    example_borrow: Option<Box<SharedView<Example>>>,
}

fn main() {
    let mut original = Owner::new(Example::new(1));
    println!("{}", original.get());
    handle_borrowed(original.borrow());
    handle_borrowed_nested(original.borrow());
    original.borrow_mut().get_mut().change();
    handle_borrowed_mut(original.borrow_mut());
    handle_owned(original.relocate());

    handle_delegated(Owner::new_with(|| Example::new(3)));

    let mut more = MoreStuff {
        example_borrow: None,
    };
    {
        let foo = Owner::new(Example::new(2));
        more.example_borrow = Some(Box::new(foo.borrow()));
        println!("Next line should abort because it would otherwise allow a use-after-free");
    }
    println!("unreachable: {}", more.example_borrow.is_some());
}

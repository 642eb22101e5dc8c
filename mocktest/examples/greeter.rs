// vim: tw=80
//! A greeter whose user directory is stubbed out.
//!
//! The greeter looks users up in a directory service, and falls back to a
//! generic greeting when the lookup fails.  Both paths are exercised without
//! a real directory.
use std::fmt;

use mocktest::*;

#[derive(Debug)]
struct Timeout;

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("directory timed out")
    }
}

impl std::error::Error for Timeout {}

struct Greeter {
    directory: Object,
}

impl Greeter {
    fn greet(&self, id: u32) -> String {
        let name = self.directory.call("lookup", call![id; locale = "en"])
            .ok()
            .flatten()
            .and_then(|v| v.get::<String>().ok());
        match name {
            Some(name) => format!("Hello, {}!", name),
            None => String::from("Hello, stranger!"),
        }
    }
}

fn main() -> Result<()> {
    let directory = Object::named("directory")
        .define("lookup", Attr::method(|_| -> Result<String> {
            Err(Error::Signature("no directory configured".into()))
        }));
    let greeter = Greeter{directory: directory.clone()};

    let txn = MockTransaction::new();
    let scope = txn.begin()?;
    scope.expect(&directory).acquire("lookup")?
        .with(args![1u32; locale = "en"])?
        .and_return(String::from("Alice"))?
        .once();
    scope.when(&directory).acquire("lookup")?
        .with(args![2u32; locale = "en"])?
        .and_raise(Timeout)?;
    println!("{}", greeter.greet(1));
    println!("{}", greeter.greet(2));
    scope.finish()?;

    // The original lookup is back in place
    println!("{}", greeter.greet(1));
    Ok(())
}

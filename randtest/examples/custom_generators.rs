//! Custom generator examples
//!
//! Shows the three ways of plugging a new domain into randtest: a generator
//! closure, a `CustomGenerate` implementation, and a domain object that exposes
//! the capability through `Domain`.

use randtest::{
    BufferLogger, CustomGenerate, Descriptor, Domain, GenerationError, RandomSource, Tester,
    Value,
};

#[derive(Debug, Clone, PartialEq)]
struct EmailAddress {
    local: String,
    domain: String,
}

impl EmailAddress {
    fn as_string(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

/// Generates addresses under a fixed set of domains
#[derive(Debug)]
struct EmailDomain {
    domains: Vec<&'static str>,
}

impl CustomGenerate for EmailDomain {
    fn custom_generate(&self, rng: &mut dyn RandomSource) -> Result<Value, GenerationError> {
        let local = rng.get_string("1,20 a-z%d._")?;
        let index = rng.get_int(self.domains.len() as i64)?;
        let domain = self.domains[index as usize].to_string();
        Ok(Value::object(EmailAddress { local, domain }))
    }
}

impl Domain for EmailDomain {
    fn shape(&self) -> &'static str {
        "email"
    }

    fn as_custom_generate(&self) -> Option<&dyn CustomGenerate> {
        Some(self)
    }
}

/// Closure generator producing a sorted list of small integers
fn sorted_list(rng: &mut dyn RandomSource) -> Result<Value, GenerationError> {
    let len = rng.get_int(16)?;
    let mut items = (0..len)
        .map(|_| rng.get_int_range(-20, 20))
        .collect::<Result<Vec<_>, _>>()?;
    items.sort_unstable();
    Ok(Value::List(items.into_iter().map(Value::Int).collect()))
}

fn main() {
    let log = BufferLogger::new();
    let mut tester = match Tester::builder().count(200).seed(99).log(log.clone()).build() {
        Ok(tester) => tester,
        Err(error) => {
            eprintln!("invalid configuration: {}", error);
            return;
        }
    };

    let emails = Descriptor::object(EmailDomain {
        domains: vec!["example.com", "test.org", "mail.net"],
    });
    let result = tester.test(
        Some("emails have one @"),
        |args: &[Value]| {
            args[0]
                .downcast_ref::<EmailAddress>()
                .is_some_and(|email| email.as_string().matches('@').count() == 1)
        },
        &[emails],
    );
    println!("{:?}", result.map(|report| report.to_string()));

    let result = tester.test(
        Some("sorted lists stay sorted"),
        |args: &[Value]| {
            let items: Vec<i64> = args[0]
                .as_list()
                .unwrap_or_default()
                .iter()
                .filter_map(Value::as_int)
                .collect();
            items.windows(2).all(|pair| pair[0] <= pair[1])
        },
        &[Descriptor::function(sorted_list)],
    );
    println!("{:?}", result.map(|report| report.to_string()));

    print!("{}", log.contents());
}

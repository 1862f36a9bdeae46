use ludeme_forge::{Generator, Grammar, RandomPolicy};

fn main() {
    let grammar = Grammar::from_file("demos/board.ebnf").expect("failed to load grammar");

    println!("{grammar}");
    println!("{}", grammar.audit());

    let mut generator = Generator::new(&grammar, RandomPolicy::new(0));
    for seed in 0..3 {
        match generator.generate("game", seed).expect("unknown start symbol").into_text() {
            Some(text) => println!("{text}"),
            None => println!("No text for seed {seed}."),
        }
    }
}

use rvltl_core::*;

fn unary(f: impl Fn(Atom) -> Ltl) -> (Formula, Atom) {
    let mut builder = FormulaBuilder::new();
    let p = builder.new_atom();
    let formula = builder.build(f(p)).expect("build");
    (formula, p)
}

fn binary(f: impl Fn(Atom, Atom) -> Ltl) -> (Formula, Atom, Atom) {
    let mut builder = FormulaBuilder::new();
    let p = builder.new_atom();
    let q = builder.new_atom();
    let formula = builder.build(f(p, q)).expect("build");
    (formula, p, q)
}

fn run(monitor: &mut Monitor, p: Atom, q: Atom, steps: &[(bool, bool)]) -> Result<B4, MissingAtoms> {
    for &(vp, vq) in steps {
        monitor.update([(p, vp), (q, vq)])?;
    }
    Ok(monitor.evaluate())
}

#[test]
fn trivial() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::Atom);
    let mut monitor = formula.monitor();
    monitor.update([(p, true)])?;
    assert_eq!(monitor.evaluate(), B4::True);

    let mut monitor = formula.monitor();
    monitor.update([(p, false)])?;
    assert_eq!(monitor.evaluate(), B4::False);
    Ok(())
}

#[test]
fn update_by_identifier() -> Result<(), MissingAtoms> {
    let mut builder = FormulaBuilder::new();
    let alice = builder.new_identified_atom("alice", None).expect("atom");
    let bob = builder.new_identified_atom("bob", None).expect("atom");
    let formula = builder.build(Ltl::and([alice, bob])).expect("build");
    let mut monitor = formula.monitor();
    monitor.update([("alice", true), ("bob", true), ("carol", false)])?;
    assert_eq!(monitor.evaluate(), B4::True);
    monitor.update([("alice".to_string(), true), ("bob".to_string(), false)])?;
    assert_eq!(monitor.evaluate_at(1), B4::False);
    Ok(())
}

#[test]
fn update_missing() {
    let mut builder = FormulaBuilder::new();
    let p = builder.new_named_atom("atomic_proposition_1");
    let formula = builder.build(Ltl::Atom(p)).expect("build");
    let err = formula
        .monitor()
        .update::<Atom, _>([])
        .expect_err("missing atom");
    assert!(err.to_string().contains("atomic_proposition_1"));
}

#[test]
fn update_missing_unnamed() {
    let mut builder = FormulaBuilder::new();
    let p = builder.new_named_atom("atomic_proposition_1");
    let q = builder.new_atom();
    let formula = builder.build(Ltl::and([p, q])).expect("build");
    let err = formula
        .monitor()
        .update([(p, true)])
        .expect_err("missing atom");
    assert_eq!(err.atoms, vec![q]);
    assert!(err.names.is_empty());
    assert_eq!(err.unnamed, 1);
    assert!(err.to_string().contains("1 unnamed atomic proposition"));
}

#[test]
fn failed_update_keeps_state() -> Result<(), MissingAtoms> {
    let (formula, p, q) = binary(Ltl::until);
    let mut monitor = formula.monitor();
    monitor.update([(p, true), (q, false)])?;
    let before = (monitor.last_index(), monitor.evaluate());
    monitor
        .update([(p, false)])
        .expect_err("q is missing");
    assert_eq!(monitor.last_index(), Some(0));
    assert_eq!(monitor.history(p), Some([true].as_slice()));
    assert_eq!(monitor.history(q), Some([false].as_slice()));
    assert_eq!((monitor.last_index(), monitor.evaluate()), before);
    Ok(())
}

#[test]
fn unused_atoms_are_ignored() -> Result<(), MissingAtoms> {
    let mut builder = FormulaBuilder::new();
    let p = builder.new_atom();
    let unused = builder.new_atom();
    let formula = builder.build(Ltl::Atom(p)).expect("build");
    let mut monitor = formula.monitor();
    // An unused atom is neither required nor recorded.
    monitor.update([(p, true), (unused, false)])?;
    monitor.update([(p, true)])?;
    assert_eq!(monitor.history(unused), None);
    assert_eq!(monitor.evaluate(), B4::True);
    Ok(())
}

#[test]
fn same_name_different_atoms() -> Result<(), MissingAtoms> {
    let mut builder = FormulaBuilder::new();
    let request = builder.new_named_atom("request");
    let response = builder.new_named_atom("request");
    let formula = builder
        .build(Ltl::and([request, response]))
        .expect("build");
    let mut monitor = formula.monitor();
    let err = monitor.update([(request, true)]).expect_err("missing");
    assert_eq!(err.names, vec!["request".to_string()]);
    monitor.update([(request, true), (response, false)])?;
    assert_eq!(monitor.evaluate(), B4::False);
    Ok(())
}

#[test]
fn not() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(|p| !Ltl::Atom(p));
    let mut monitor = formula.monitor();
    monitor.update([(p, true)])?;
    assert_eq!(monitor.evaluate(), B4::False);
    Ok(())
}

#[test]
fn not_presumably_true() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::always);
    let mut monitor = formula.monitor();
    monitor.update([(p, true)])?;
    assert_eq!(monitor.evaluate(), B4::PresumablyTrue);
    Ok(())
}

#[test]
fn not_presumably_false() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::eventually);
    let mut monitor = formula.monitor();
    monitor.update([(p, false)])?;
    assert_eq!(monitor.evaluate(), B4::PresumablyFalse);
    Ok(())
}

#[test]
fn and() -> Result<(), MissingAtoms> {
    let (formula, p, q) = binary(|p, q| Ltl::and([p, q]));
    for (vp, vq, expected) in [
        (true, true, B4::True),
        (true, false, B4::False),
        (false, true, B4::False),
        (false, false, B4::False),
    ] {
        let mut monitor = formula.monitor();
        assert_eq!(run(&mut monitor, p, q, &[(vp, vq)])?, expected);
    }
    Ok(())
}

#[test]
fn or() -> Result<(), MissingAtoms> {
    let (formula, p, q) = binary(|p, q| Ltl::Atom(p) | Ltl::Atom(q));
    for (vp, vq, expected) in [
        (true, true, B4::True),
        (true, false, B4::True),
        (false, true, B4::True),
        (false, false, B4::False),
    ] {
        let mut monitor = formula.monitor();
        assert_eq!(run(&mut monitor, p, q, &[(vp, vq)])?, expected);
    }
    Ok(())
}

#[test]
fn vacuous() -> Result<(), MissingAtoms> {
    for (ltl, expected) in [
        (Ltl::and::<_, Ltl>([]), B4::True),
        (Ltl::or::<_, Ltl>([]), B4::False),
        (Ltl::True, B4::True),
        (Ltl::False, B4::False),
    ] {
        let formula = FormulaBuilder::new().build(ltl).expect("build");
        let mut monitor = formula.monitor();
        monitor.update::<Atom, _>([])?;
        assert_eq!(monitor.evaluate(), expected);
    }
    Ok(())
}

#[test]
fn next() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::next);

    let mut monitor = formula.monitor();
    monitor.update([(p, true)])?;
    monitor.update([(p, false)])?;
    assert_eq!(monitor.evaluate(), B4::False);

    let mut monitor = formula.monitor();
    monitor.update([(p, false)])?;
    monitor.update([(p, true)])?;
    assert_eq!(monitor.evaluate(), B4::True);

    let mut monitor = formula.monitor();
    monitor.update([(p, true)])?;
    assert_eq!(monitor.evaluate(), B4::PresumablyFalse);
    Ok(())
}

#[test]
fn next_at_last_index() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::next);
    let mut monitor = formula.monitor();
    for b in [true, false, true, true, false] {
        monitor.update([(p, b)])?;
        let last = monitor.last_index().expect("non-empty trace");
        assert_eq!(monitor.evaluate_at(last), B4::PresumablyFalse);
    }
    Ok(())
}

#[test]
fn always() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::always);
    let mut monitor = formula.monitor();
    for _ in 0..10 {
        monitor.update([(p, true)])?;
    }
    assert_eq!(monitor.evaluate(), B4::PresumablyTrue);

    let mut monitor = formula.monitor();
    monitor.update([(p, false)])?;
    for _ in 0..10 {
        monitor.update([(p, true)])?;
        assert_eq!(monitor.evaluate(), B4::False);
    }
    Ok(())
}

#[test]
fn always_stays_violated() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::always);
    let mut monitor = formula.monitor();
    for b in [true, true, true] {
        monitor.update([(p, b)])?;
    }
    monitor.update([(p, false)])?;
    for _ in 0..5 {
        monitor.update([(p, true)])?;
        // Every suffix starting at or before the violation is violated.
        for i in 0..=3 {
            assert_eq!(monitor.evaluate_at(i), B4::False);
        }
        assert_eq!(monitor.evaluate_at(4), B4::PresumablyTrue);
    }
    Ok(())
}

#[test]
fn until() -> Result<(), MissingAtoms> {
    let (formula, p, q) = binary(Ltl::until);
    let t = true;
    let f = false;

    let mut monitor = formula.monitor();
    assert_eq!(run(&mut monitor, p, q, &[(t, f), (t, f), (t, f), (t, t)])?, B4::True);

    // Clearly violated at the third step.
    let mut monitor = formula.monitor();
    assert_eq!(run(&mut monitor, p, q, &[(t, f), (t, f), (f, f), (t, t)])?, B4::False);

    // q can still happen.
    let mut monitor = formula.monitor();
    assert_eq!(
        run(&mut monitor, p, q, &[(t, f), (t, f), (t, f), (t, f)])?,
        B4::PresumablyFalse
    );

    // p does not need to hold once q does.
    let mut monitor = formula.monitor();
    assert_eq!(
        run(&mut monitor, p, q, &[(t, f), (t, f), (t, f), (f, t), (f, f)])?,
        B4::True
    );
    Ok(())
}

#[test]
fn until_first_witness() -> Result<(), MissingAtoms> {
    let (formula, p, q) = binary(Ltl::until);
    let mut monitor = formula.monitor();
    // p fails before the first witness.
    assert_eq!(
        run(&mut monitor, p, q, &[(false, false), (true, true), (true, true)])?,
        B4::False
    );
    // From index 1 the witness is immediate.
    assert_eq!(monitor.evaluate_at(1), B4::True);
    Ok(())
}

#[test]
fn until_presumable_witness() -> Result<(), MissingAtoms> {
    // p U (G q): a witness is only presumably true.
    let (formula, p, q) = binary(|p, q| Ltl::until(p, Ltl::always(q)));
    let mut monitor = formula.monitor();
    assert_eq!(
        run(&mut monitor, p, q, &[(true, false), (true, true), (false, true)])?,
        B4::PresumablyTrue
    );
    Ok(())
}

#[test]
fn eventually() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::eventually);
    let mut monitor = formula.monitor();
    for _ in 0..10 {
        monitor.update([(p, false)])?;
        assert_eq!(monitor.evaluate(), B4::PresumablyFalse);
    }
    monitor.update([(p, true)])?;
    assert_eq!(monitor.evaluate(), B4::True);
    for b in [false, true, false] {
        monitor.update([(p, b)])?;
        assert_eq!(monitor.evaluate(), B4::True);
    }
    Ok(())
}

#[test]
fn implies() -> Result<(), MissingAtoms> {
    let (formula, p, q) = binary(Ltl::implies);
    let mut monitor = formula.monitor();
    assert_eq!(run(&mut monitor, p, q, &[(true, false)])?, B4::False);
    let mut monitor = formula.monitor();
    assert_eq!(run(&mut monitor, p, q, &[(false, false)])?, B4::True);
    Ok(())
}

#[test]
fn request_response() -> Result<(), MissingAtoms> {
    let mut builder = FormulaBuilder::new();
    let request = builder.new_named_atom("request");
    let response = builder.new_named_atom("response");
    let formula = builder
        .build(Ltl::always(Ltl::implies(request, Ltl::eventually(response))))
        .expect("build");
    let mut monitor = formula.monitor();
    monitor.update([(request, false), (response, false)])?;
    assert_eq!(monitor.evaluate(), B4::PresumablyTrue);
    monitor.update([(request, true), (response, false)])?;
    assert_eq!(monitor.evaluate(), B4::PresumablyFalse);
    monitor.update([(request, false), (response, true)])?;
    assert_eq!(monitor.evaluate(), B4::PresumablyTrue);
    Ok(())
}

#[test]
fn independent_monitors() -> Result<(), MissingAtoms> {
    let (formula, p) = unary(Ltl::always);
    let mut first = formula.monitor();
    let mut second = formula.monitor();
    first.update([(p, false)])?;
    second.update([(p, true)])?;
    assert_eq!(first.evaluate(), B4::False);
    assert_eq!(second.evaluate(), B4::PresumablyTrue);
    assert_eq!(formula.monitor().last_index(), None);
    Ok(())
}

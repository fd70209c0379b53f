//! End-to-end tests: compile Ink source and play the resulting story.

use inkc::compiler::compile;
use inkc::runtime::{RuntimeError, Story};

fn story(source: &str) -> Story {
    let program = compile(source).expect("story should compile");
    Story::new(program)
}

/// Drain output lines until the story stops at a choice point or the end.
fn drain(story: &mut Story) -> Vec<String> {
    let mut lines = Vec::new();
    while story.can_continue() {
        if let Some(line) = story.continue_story().expect("story should run") {
            lines.push(line);
        }
    }
    lines
}

fn choice_texts(story: &Story) -> Vec<String> {
    story.choices().iter().map(|c| c.text.clone()).collect()
}

// ============================================================================
// Content
// ============================================================================

#[test]
fn hello_world() {
    let mut story = story("Hello, world!\n");
    assert_eq!(drain(&mut story), ["Hello, world!"]);
    assert!(!story.can_continue());
}

#[test]
fn lines_come_out_in_order() {
    let mut story = story("One.\nTwo.\nThree.\n");
    assert_eq!(drain(&mut story), ["One.", "Two.", "Three."]);
}

#[test]
fn glue_joins_adjacent_lines() {
    let mut story = story("We hurried home <>\nto Savile Row.\n");
    assert_eq!(drain(&mut story), ["We hurried home to Savile Row."]);
}

#[test]
fn trailing_glue_at_story_end_still_prints() {
    let mut story = story("No newline after me<>\n");
    assert_eq!(drain(&mut story), ["No newline after me"]);
}

#[test]
fn inline_logic_renders_values() {
    let mut story = story("VAR x = 2\n~ x = x + 3\nTotal: {x}\n");
    assert_eq!(drain(&mut story), ["Total: 5"]);
}

#[test]
fn string_globals_interpolate() {
    let mut story = story("VAR name = \"Ada\"\nHello {name}!\n");
    assert_eq!(drain(&mut story), ["Hello Ada!"]);
}

// ============================================================================
// Knots, stitches, functions
// ============================================================================

#[test]
fn divert_enters_a_knot() {
    let mut story = story("-> hike\n== hike ==\nUp we go.\n-> END\n");
    assert_eq!(drain(&mut story), ["Up we go."]);
}

#[test]
fn qualified_divert_reaches_a_stitch() {
    let source = "\
-> hike.summit
== hike ==
Climbing.
= summit
The view is great.
-> END
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["The view is great."]);
}

#[test]
fn knot_falls_off_its_end() {
    // Without a divert the knot simply exits.
    let mut story = story("-> hike\n== hike ==\nDone walking.\n");
    assert_eq!(drain(&mut story), ["Done walking."]);
    assert!(!story.can_continue());
}

#[test]
fn function_calls_return_values() {
    let source = "\
The answer is {double(21)}.

== function double(n) ==
~ return n * 2
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["The answer is 42."]);
}

#[test]
fn temps_are_local_to_a_call() {
    let source = "\
{sum(1, 2)} and {sum(10, 20)}

== function sum(a, b) ==
~ temp total = a + b
~ return total
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["3 and 30"]);
}

// ============================================================================
// Choices and gathers
// ============================================================================

#[test]
fn choices_pause_the_story() {
    let source = "\
An intersection.
* [Go left]You chose left.
* [Go right]You chose right.
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["An intersection."]);
    assert_eq!(choice_texts(&story), ["Go left", "Go right"]);

    story.choose(1).expect("first choice exists");
    assert_eq!(drain(&mut story), ["You chose left."]);
    assert!(!story.can_continue());
}

#[test]
fn gather_rejoins_after_a_choice() {
    let source = "\
* [One]First.
* [Two]Second.
- Both roads meet here.
";
    let mut story = story(source);
    drain(&mut story);
    story.choose(2).expect("second choice exists");
    assert_eq!(drain(&mut story), ["Second.", "Both roads meet here."]);
}

#[test]
fn choice_bodies_run_their_nested_content() {
    let source = "\
* [Up]Going up.
  Higher and higher.
* [Down]Going down.
- Done.
";
    let mut story = story(source);
    drain(&mut story);
    story.choose(1).expect("first choice exists");
    assert_eq!(
        drain(&mut story),
        ["Going up.", "Higher and higher.", "Done."]
    );
}

#[test]
fn out_of_range_choice_is_rejected() {
    let mut story = story("* [Only]Fine.\n");
    drain(&mut story);
    assert!(matches!(
        story.choose(0),
        Err(RuntimeError::InvalidChoice(0))
    ));
    assert!(matches!(
        story.choose(2),
        Err(RuntimeError::InvalidChoice(2))
    ));
    story.choose(1).expect("in-range choice");
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn block_conditional_picks_the_live_arm() {
    let source = "\
VAR mood = 3
{mood > 2:
Cheerful.
- else:
Grim.
}
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["Cheerful."]);
}

#[test]
fn switch_matches_a_literal_case() {
    let source = "\
VAR coins = 2
{coins:
- 1: One coin.
- 2: Two coins.
- else: Many coins.
}
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["Two coins."]);
}

#[test]
fn switch_falls_back_to_else() {
    let source = "\
VAR coins = 7
{coins:
- 1: One coin.
- 2: Two coins.
- else: Many coins.
}
";
    let mut story = story(source);
    assert_eq!(drain(&mut story), ["Many coins."]);
}

#[test]
fn inline_conditional_in_content() {
    let mut story = story("VAR armed = false\nYou are {armed: armed}unarmed.\n");
    assert_eq!(drain(&mut story), ["You are unarmed."]);
}

#[test]
fn logical_or_short_circuits() {
    // The right side would divide by zero if evaluated.
    let mut story = story("VAR ok = true\n{ok or 1 / 0 > 0:Safe.}\n");
    assert_eq!(drain(&mut story), ["Safe."]);
}

// ============================================================================
// Runtime failures
// ============================================================================

#[test]
fn integer_division_by_zero_errors() {
    let mut story = story("~ temp x = 1 / 0\n");
    assert!(matches!(
        story.continue_story(),
        Err(RuntimeError::DivisionByZero)
    ));
}

#[test]
fn runaway_recursion_overflows() {
    let source = "\
~ loop(0)
== function loop(n) ==
~ return loop(n + 1)
";
    let mut story = story(source);
    let err = story.continue_story().expect_err("recursion should fail");
    assert!(matches!(
        err,
        RuntimeError::CallDepthExceeded | RuntimeError::StackOverflow
    ));
}

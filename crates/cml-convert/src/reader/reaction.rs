use chemgraph::{Annotation, Model, Point, Reaction, ReactionScheme, ReactionType};
use roxmltree::Node;

use super::RecordIssue;
use crate::{
    errors::ImportIssue,
    xml::{attr, child_named, children_named, inner_markup, non_blank_attr, parse_attr, parse_bool},
};

/// Payloads containing this run are rendered as a charge symbol and can't be edited as text
const CHARGE_RUN: &str = "<Run>+</Run>";

/// Reads every reaction scheme. Must run after all molecules have been read, since participants are looked up by the
/// ids of top-level molecules.
pub(super) fn read_reaction_schemes(model: &mut Model, raw: &str, root: Node) {
    for scheme_node in children_named(root, "reactionScheme") {
        let mut scheme = ReactionScheme {
            id: attr(scheme_node, "id").unwrap_or_default().trim().to_owned(),
            reactions: Vec::new(),
        };
        for reaction_node in children_named(scheme_node, "reaction") {
            let reaction = read_reaction(model, raw, reaction_node);
            scheme.reactions.push(reaction);
        }
        model.reaction_schemes.push(scheme);
    }
}

fn read_reaction(model: &mut Model, raw: &str, node: Node) -> Reaction {
    let arrow_point = |name| non_blank_attr(node, name).and_then(parse_point);
    let rich_text = |name| child_named(node, name).map(|n| inner_markup(raw, n).to_owned());

    let mut reaction = Reaction {
        id: attr(node, "id").unwrap_or_default().trim().to_owned(),
        tail: arrow_point("arrowTail").unwrap_or_default(),
        head: arrow_point("arrowHead").unwrap_or_default(),
        reaction_type: non_blank_attr(node, "reactionType")
            .and_then(ReactionType::from_token)
            .unwrap_or_default(),
        reagents: rich_text("reagentText"),
        conditions: rich_text("conditionsText"),
        ..Reaction::default()
    };

    let roles = [
        ("reactant", "reactantList", &mut reaction.reactants),
        ("product", "productList", &mut reaction.products),
    ];
    for (role, list, participants) in roles {
        let references = children_named(node, list)
            .flat_map(|l| children_named(l, role))
            .filter_map(|p| non_blank_attr(p, "ref"));
        for reference in references {
            if let Some(key) = model.find_molecule(reference) {
                participants.insert(key);
            } else {
                model.record(ImportIssue::unresolved_participant(&reaction.id, role, reference));
            }
        }
    }

    reaction
}

/// Parses arrow end-points written as `x,y` (or separated by whitespace)
fn parse_point(text: &str) -> Option<Point> {
    let mut coordinates = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|c| !c.is_empty())
        .map(str::parse);
    let x = coordinates.next()?.ok()?;
    let y = coordinates.next()?.ok()?;
    coordinates.next().is_none().then_some(Point { x, y })
}

pub(super) fn read_annotations(model: &mut Model, raw: &str, root: Node) {
    for node in children_named(root, "annotation") {
        let position = Point {
            x: parse_attr(node, "x2").unwrap_or_default(),
            y: parse_attr(node, "y2").unwrap_or_default(),
        };
        let mut annotation = Annotation::new(position, inner_markup(raw, node));
        attr(node, "id").unwrap_or_default().trim().clone_into(&mut annotation.id);
        annotation.symbol_size = parse_attr(node, "symbolSize").unwrap_or_default();
        annotation.is_editable = non_blank_attr(node, "isEditable")
            .and_then(parse_bool)
            .unwrap_or(true);

        if annotation.xaml.contains(CHARGE_RUN) {
            annotation.is_editable = false;
        }
        model.annotations.push(annotation);
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use crate::{ImportOptions, import, testing_tools::CATALOG};

    use super::*;

    const REACTION: &str = indoc! {r#"
        <cml:cml xmlns:cml="http://www.xml-cml.org/schema" xmlns:c4w="http://www.chem4word.com/cml">
          <cml:molecule id="m1">
            <cml:atom id="a1" elementType="C" x2="0" y2="0"/>
          </cml:molecule>
          <cml:molecule id="m2">
            <cml:atom id="a1" elementType="O" x2="60" y2="0"/>
          </cml:molecule>
          <cml:reactionScheme id="rs1">
            <cml:reaction id="rs1.r1" c4w:reactionType="Reversible" c4w:arrowTail="10,5" c4w:arrowHead="50 5">
              <c4w:reagentText><FlowDocument><Paragraph>H<Run Typography.Variants="Subscript">2</Run>O</Paragraph></FlowDocument></c4w:reagentText>
              <cml:reactantList>
                <cml:reactant ref="m1"/>
                <cml:reactant ref="m9"/>
                <cml:reactant ref="m1"/>
              </cml:reactantList>
              <cml:productList>
                <cml:product ref="m2"/>
              </cml:productList>
            </cml:reaction>
            <cml:reaction c4w:reactionType="Sideways"/>
          </cml:reactionScheme>
        </cml:cml>
    "#};

    #[test]
    fn reactions() {
        let model = import(&CATALOG, REACTION, &ImportOptions::default());
        let keys: Vec<_> = model.molecules().map(|(k, _)| k).collect();

        assert_eq!(model.reaction_schemes.len(), 1);
        let scheme = &model.reaction_schemes[0];
        assert_eq!(scheme.id, "rs1");
        assert_eq!(scheme.reactions.len(), 2);

        let reaction = &scheme.reactions[0];
        assert_eq!(reaction.reaction_type, ReactionType::Reversible);
        assert_eq!(reaction.tail, Point { x: 10.0, y: 5.0 });
        assert_eq!(reaction.head, Point { x: 50.0, y: 5.0 });
        assert_eq!(reaction.reactants.iter().copied().collect::<Vec<_>>(), [keys[0]]);
        assert_eq!(reaction.products.iter().copied().collect::<Vec<_>>(), [keys[1]]);
        assert_snapshot!(reaction.reagents.as_deref().unwrap(), @r#"<FlowDocument><Paragraph>H<Run Typography.Variants="Subscript">2</Run>O</Paragraph></FlowDocument>"#);
        assert_eq!(reaction.conditions, None);

        // Unknown reaction types fall back to the default
        assert_eq!(scheme.reactions[1].reaction_type, ReactionType::Normal);
        assert_eq!(scheme.reactions[1].tail, Point::default());

        assert_snapshot!(model.all_warnings().join("\n"), @r#"the reaction "rs1.r1" references the unknown reactant "m9""#);
        assert!(model.all_errors().is_empty());
    }

    #[test]
    fn arrow_points() {
        assert_eq!(parse_point("1.5,-2"), Some(Point { x: 1.5, y: -2.0 }));
        assert_eq!(parse_point(" 3 , 4 "), Some(Point { x: 3.0, y: 4.0 }));
        assert_eq!(parse_point("3"), None);
        assert_eq!(parse_point("3,4,5"), None);
        assert_eq!(parse_point("x,4"), None);
    }

    #[test]
    fn annotations() {
        let model = import(
            &CATALOG,
            indoc! {r#"
                <cml:cml xmlns:cml="http://www.xml-cml.org/schema" xmlns:c4w="http://www.chem4word.com/cml">
                  <c4w:annotation id="an1" x2="12.5" y2="40" symbolSize="15" isEditable="true"><FlowDocument><Paragraph><Run>+</Run></Paragraph></FlowDocument></c4w:annotation>
                  <c4w:annotation id="an2" x2="0" y2="0" symbolSize="15" isEditable="false"><FlowDocument/></c4w:annotation>
                  <c4w:annotation id="an3" symbolSize="15"><FlowDocument><Paragraph><Run>Note</Run></Paragraph></FlowDocument></c4w:annotation>
                </cml:cml>
            "#},
            &ImportOptions::default(),
        );

        let annotations = &model.annotations;
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].position, Point { x: 12.5, y: 40.0 });
        assert_eq!(annotations[0].symbol_size, 15.0);
        let editable: Vec<_> = annotations.iter().map(|a| a.is_editable).collect();
        assert_eq!(editable, [false, false, true]);
        assert_eq!(
            annotations[2].xaml,
            "<FlowDocument><Paragraph><Run>Note</Run></Paragraph></FlowDocument>"
        );
    }
}

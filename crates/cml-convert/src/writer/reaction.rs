use std::io;

use chemgraph::{Annotation, Model, MoleculeKey, Point, Reaction, ReactionScheme};

use super::Attributes;
use crate::xml::{XmlWriter, empty, end, markup_element, start, with_xaml_namespaces};

pub(super) fn write_reaction_scheme(
    writer: &mut XmlWriter,
    model: &Model,
    scheme: &ReactionScheme,
) -> io::Result<()> {
    start(writer, "cml:reactionScheme", &[("id", scheme.id.as_str())])?;
    for reaction in &scheme.reactions {
        write_reaction(writer, model, reaction)?;
    }
    end(writer, "cml:reactionScheme")
}

fn write_reaction(writer: &mut XmlWriter, model: &Model, reaction: &Reaction) -> io::Result<()> {
    let point = |p: Point| format!("{},{}", p.x, p.y);
    let attributes = Attributes::new()
        .with("id", &reaction.id)
        .with("c4w:reactionType", reaction.reaction_type.as_str())
        .with("c4w:arrowTail", point(reaction.tail))
        .with("c4w:arrowHead", point(reaction.head));
    start(writer, "cml:reaction", &attributes.pairs())?;

    if let Some(reagents) = &reaction.reagents {
        markup_element(writer, "c4w:reagentText", &[], &with_xaml_namespaces(reagents))?;
    }
    if let Some(conditions) = &reaction.conditions {
        markup_element(writer, "c4w:conditionsText", &[], &with_xaml_namespaces(conditions))?;
    }
    write_participants(writer, model, "cml:reactantList", "cml:reactant", &reaction.reactants)?;
    write_participants(writer, model, "cml:productList", "cml:product", &reaction.products)?;

    end(writer, "cml:reaction")
}

fn write_participants<'k>(
    writer: &mut XmlWriter,
    model: &Model,
    list: &str,
    item: &str,
    keys: impl IntoIterator<Item = &'k MoleculeKey>,
) -> io::Result<()> {
    let refs: Vec<_> = keys
        .into_iter()
        .filter_map(|&key| model.molecule(key))
        .map(|molecule| molecule.id.as_str())
        .collect();
    if refs.is_empty() {
        return Ok(());
    }

    start(writer, list, &[])?;
    for molecule_ref in refs {
        empty(writer, item, &[("ref", molecule_ref)])?;
    }
    end(writer, list)
}

pub(super) fn write_annotation(writer: &mut XmlWriter, annotation: &Annotation) -> io::Result<()> {
    let attributes = Attributes::new()
        .with("id", &annotation.id)
        .with("x2", annotation.position.x)
        .with("y2", annotation.position.y)
        .with("symbolSize", annotation.symbol_size)
        .with("isEditable", annotation.is_editable);
    let xaml = with_xaml_namespaces(&annotation.xaml);
    markup_element(writer, "c4w:annotation", &attributes.pairs(), &xaml)
}

//! Built-in schemas, registered by name.

use crate::descriptor::{FieldSpec, SchemaDefinition};
use crate::value::FieldKind::{Float, Null, String as Str};

/// Names accepted by [`crate::Schema::load`] without a file path.
pub const NAMES: &[&str] = &["echem", "photocat"];

pub fn definition(name: &str) -> Option<SchemaDefinition> {
    match name {
        "echem" => Some(echem()),
        "photocat" => Some(photocat()),
        _ => None,
    }
}

fn name_required() -> Vec<FieldSpec> {
    vec![FieldSpec::required("name", &[Str])]
}

fn name_nullable() -> Vec<FieldSpec> {
    vec![FieldSpec::required("name", &[Str, Null])]
}

/// Amount carried on reaction → compound edges.
fn amount() -> Vec<FieldSpec> {
    vec![
        FieldSpec::optional("value", &[Float, Null]),
        FieldSpec::optional("unit", &[Str, Null]),
    ]
}

/// Vertices shared by the reaction-centred schemas.
fn reaction_core(name: &str) -> SchemaDefinition {
    SchemaDefinition::new(name)
        .vertex("Study", name_required())
        .vertex(
            "Quantity",
            vec![
                FieldSpec::required("unit", &[Str, Null]),
                FieldSpec::required("value", &[Float]),
            ],
        )
        .vertex("Compound", name_nullable())
        .vertex("Atmosphere", name_nullable())
        .vertex("Comment", vec![FieldSpec::required("text", &[Str])])
        .vertex("Reaction", vec![FieldSpec::required("uuid", &[Str])])
}

/// Electrosynthesis: electrodes, electrolyte, current.
pub fn echem() -> SchemaDefinition {
    reaction_core("echem")
        .vertex("Material", name_required())
        .vertex("MaterialFamily", name_required())
        .edge("HasElectrolyte", "Reaction", "Compound", amount())
        .edge("HasProduct", "Reaction", "Compound", amount())
        .edge("HasReactant", "Reaction", "Compound", amount())
        .edge("HasSolvent", "Reaction", "Compound", amount())
        .edge("HasAnode", "Reaction", "Material", vec![])
        .edge("HasCathode", "Reaction", "Material", vec![])
        .edge("HasDuration", "Reaction", "Quantity", vec![])
        .edge("HasTemperature", "Reaction", "Quantity", vec![])
        .edge("HasCurrent", "Reaction", "Quantity", vec![])
        .edge("HasComment", "Reaction", "Comment", vec![])
        .edge("HasAtmosphere", "Reaction", "Atmosphere", vec![])
        .edge("HasReaction", "Study", "Reaction", vec![])
        .edge("IsMemberOfFamily", "Material", "MaterialFamily", vec![])
}

/// Photocatalysis: catalyst and light source instead of electrodes.
pub fn photocat() -> SchemaDefinition {
    reaction_core("photocat")
        .vertex("Photocatalyst", name_required())
        .vertex(
            "LightSource",
            vec![
                FieldSpec::required("name", &[Str]),
                FieldSpec::optional("wavelength", &[Float, Null]),
            ],
        )
        .edge("HasProduct", "Reaction", "Compound", amount())
        .edge("HasReactant", "Reaction", "Compound", amount())
        .edge("HasSolvent", "Reaction", "Compound", amount())
        .edge("HasAdditive", "Reaction", "Compound", amount())
        .edge("HasPhotocatalyst", "Reaction", "Photocatalyst", amount())
        .edge("HasLightSource", "Reaction", "LightSource", vec![])
        .edge("HasDuration", "Reaction", "Quantity", vec![])
        .edge("HasTemperature", "Reaction", "Quantity", vec![])
        .edge("HasComment", "Reaction", "Comment", vec![])
        .edge("HasAtmosphere", "Reaction", "Atmosphere", vec![])
        .edge("HasReaction", "Study", "Reaction", vec![])
}

//! Master data actions: materials, welders, inspectors, WPS, drawings

use crate::actions::{self, ActionError, ActionResult, Created};
use crate::core::identity::EntityId;
use crate::entities::{
    Drawing, Inspector, Material, MaterialFields, Project, Welder, WelderSummary, Wps,
};
use crate::store::Store;

// ===== Materials =====

pub fn get_materials(store: &Store) -> ActionResult<Vec<Material>> {
    Ok(store.all()?)
}

fn check_material(store: &Store, material: &Material) -> ActionResult<()> {
    actions::required("Mark no", &material.fields.mark_no)?;
    if material.fields.quantity <= 0 {
        return Err(ActionError::rejected("Quantity must be greater than 0"));
    }
    if let Some(project_id) = &material.project_id {
        actions::require::<Project>(store, project_id)?;
    }
    Ok(())
}

pub fn create_material(store: &Store, material: Material) -> ActionResult<Created<Material>> {
    check_material(store, &material)?;
    actions::insert(store, material)
}

pub fn update_material(store: &Store, material: &Material) -> ActionResult<()> {
    check_material(store, material)?;
    actions::update(store, material)
}

pub fn delete_material(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Material>(store, id, || "Material is still referenced".to_string())
}

/// Create every row in one transaction; any failure imports nothing
pub fn import_materials(
    store: &Store,
    rows: Vec<MaterialFields>,
    project_id: Option<EntityId>,
) -> ActionResult<usize> {
    if let Some(project_id) = &project_id {
        actions::require::<Project>(store, project_id)?;
    }
    store.transaction(|s| {
        let mut created = 0;
        for fields in rows {
            let mut material = Material::new(fields);
            material.project_id = project_id.clone();
            check_material(s, &material)?;
            s.insert(&material)?;
            created += 1;
        }
        tracing::info!(created, "imported materials");
        Ok(created)
    })
}

// ===== Welders =====

pub fn get_welders(store: &Store) -> ActionResult<Vec<WelderSummary>> {
    Ok(store.welder_summaries()?)
}

fn check_welder(welder: &Welder) -> ActionResult<()> {
    actions::required("Welder name", &welder.name)?;
    actions::required("Certification ID", &welder.cert_id)?;
    if !(0.0..=100.0).contains(&welder.score) {
        return Err(ActionError::rejected("Score must be between 0 and 100"));
    }
    Ok(())
}

pub fn create_welder(store: &Store, welder: Welder) -> ActionResult<Created<Welder>> {
    check_welder(&welder)?;
    actions::insert(store, welder)
}

pub fn update_welder(store: &Store, welder: &Welder) -> ActionResult<()> {
    check_welder(welder)?;
    actions::update(store, welder)
}

pub fn delete_welder(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Welder>(store, id, || "Welder is still referenced".to_string())
}

// ===== Inspectors =====

pub fn get_inspectors(store: &Store) -> ActionResult<Vec<Inspector>> {
    Ok(store.all()?)
}

pub fn create_inspector(store: &Store, mut inspector: Inspector) -> ActionResult<Created<Inspector>> {
    inspector.name = actions::required("Inspector name", &inspector.name)?;
    inspector.role = actions::required("Role", &inspector.role)?;
    actions::insert(store, inspector)
}

pub fn update_inspector(store: &Store, inspector: &Inspector) -> ActionResult<()> {
    actions::required("Inspector name", &inspector.name)?;
    actions::required("Role", &inspector.role)?;
    actions::update(store, inspector)
}

pub fn delete_inspector(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Inspector>(store, id, || {
        "Inspector has recorded inspections or MDR reports. Set them inactive instead.".to_string()
    })
}

// ===== WPS =====

pub fn get_wps_list(store: &Store) -> ActionResult<Vec<Wps>> {
    Ok(store.all()?)
}

pub fn create_wps(store: &Store, mut wps: Wps) -> ActionResult<Created<Wps>> {
    wps.number = actions::required("WPS number", &wps.number)?;
    let number = wps.number.clone();
    actions::insert(store, wps)
        .map_err(|e| e.on_constraint(|| format!("WPS {} already exists", number)))
}

pub fn update_wps(store: &Store, wps: &Wps) -> ActionResult<()> {
    actions::required("WPS number", &wps.number)?;
    actions::update(store, wps)
        .map_err(|e| e.on_constraint(|| format!("WPS {} already exists", wps.number)))
}

pub fn delete_wps(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Wps>(store, id, || "WPS is still referenced".to_string())
}

// ===== Drawings =====

pub fn get_drawings(store: &Store) -> ActionResult<Vec<Drawing>> {
    Ok(store.all()?)
}

fn check_drawing(store: &Store, drawing: &Drawing) -> ActionResult<()> {
    actions::required("Drawing number", &drawing.number)?;
    actions::required("Drawing title", &drawing.title)?;
    if let Some(project_id) = &drawing.project_id {
        actions::require::<Project>(store, project_id)?;
    }
    Ok(())
}

pub fn create_drawing(store: &Store, drawing: Drawing) -> ActionResult<Created<Drawing>> {
    check_drawing(store, &drawing)?;
    actions::insert(store, drawing)
}

pub fn update_drawing(store: &Store, drawing: &Drawing) -> ActionResult<()> {
    check_drawing(store, drawing)?;
    actions::update(store, drawing)
}

/// Bump a drawing's revision counter
pub fn revise_drawing(store: &Store, id: &EntityId) -> ActionResult<Drawing> {
    let mut drawing: Drawing = actions::fetch(store, id)?;
    drawing.revision += 1;
    actions::update(store, &drawing)?;
    Ok(drawing)
}

pub fn delete_drawing(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Drawing>(store, id, || "Drawing is still referenced".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::WeldProcess;

    fn fields(mark: &str, qty: i64) -> MaterialFields {
        MaterialFields {
            mark_no: mark.to_string(),
            quantity: qty,
            ..Default::default()
        }
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let store = Store::open_in_memory().unwrap();
        let err = import_materials(&store, vec![fields("B1", 2), fields("B2", 0)], None).unwrap_err();
        assert_eq!(err.user_message(), "Quantity must be greater than 0");
        assert!(get_materials(&store).unwrap().is_empty());

        let n = import_materials(&store, vec![fields("B1", 2), fields("B2", 1)], None).unwrap();
        assert_eq!(n, 2);
        assert_eq!(get_materials(&store).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_wps_number_rejected() {
        let store = Store::open_in_memory().unwrap();
        create_wps(&store, Wps::new("WPS-001".to_string(), WeldProcess::Smaw)).unwrap();
        let err = create_wps(&store, Wps::new("WPS-001".to_string(), WeldProcess::Gtaw)).unwrap_err();
        assert_eq!(err.user_message(), "WPS WPS-001 already exists");
    }

    #[test]
    fn test_revise_drawing() {
        let store = Store::open_in_memory().unwrap();
        let created = create_drawing(
            &store,
            Drawing::new("GA-100".to_string(), "General arrangement".to_string()),
        )
        .unwrap();
        let revised = revise_drawing(&store, &created.record.id).unwrap();
        assert_eq!(revised.revision, 1);
        assert_eq!(actions::fetch::<Drawing>(&store, &created.record.id).unwrap().revision, 1);
    }

    #[test]
    fn test_welder_score_range() {
        let store = Store::open_in_memory().unwrap();
        let mut welder = Welder::new("A".to_string(), "W-1".to_string());
        welder.score = 140.0;
        assert!(create_welder(&store, welder).is_err());
    }
}

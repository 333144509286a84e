//! Departments and positions.

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::models::{Department, DepartmentInput, Position, PositionInput, PositionView};
use crate::orm::error::DataError;
use crate::schema::{departments, employees, positions};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

fn last_insert_id(conn: &mut SqliteConnection) -> Result<i32, diesel::result::Error> {
    Ok(diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid as i32)
}

fn department_name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    exclude_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    let mut query = departments::table
        .filter(departments::name.eq(name))
        .into_boxed();
    if let Some(id) = exclude_id {
        query = query.filter(departments::id.ne(id));
    }
    Ok(query.count().get_result::<i64>(conn)? > 0)
}

fn position_name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    exclude_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    let mut query = positions::table
        .filter(positions::name.eq(name))
        .into_boxed();
    if let Some(id) = exclude_id {
        query = query.filter(positions::id.ne(id));
    }
    Ok(query.count().get_result::<i64>(conn)? > 0)
}

fn normalized(name: &str) -> Result<String, DataError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DataError::invalid("Name is required"));
    }
    Ok(name.to_string())
}

fn ensure_department_exists(
    conn: &mut SqliteConnection,
    department_id: Option<i32>,
) -> Result<(), DataError> {
    if let Some(id) = department_id {
        if get_department(conn, id)?.is_none() {
            return Err(DataError::NotFound("Department"));
        }
    }
    Ok(())
}

pub fn add_department(
    conn: &mut SqliteConnection,
    input: DepartmentInput,
) -> Result<Department, DataError> {
    let name = normalized(&input.name)?;
    if department_name_taken(conn, &name, None)? {
        return Err(DataError::conflict(format!(
            "Department '{}' already exists",
            name
        )));
    }
    diesel::insert_into(departments::table)
        .values(&DepartmentInput {
            name,
            description: input.description,
        })
        .execute(conn)?;
    let id = last_insert_id(conn)?;
    Ok(departments::table
        .filter(departments::id.eq(id))
        .first::<Department>(conn)?)
}

pub fn get_department(
    conn: &mut SqliteConnection,
    department_id: i32,
) -> Result<Option<Department>, diesel::result::Error> {
    departments::table
        .filter(departments::id.eq(department_id))
        .first::<Department>(conn)
        .optional()
}

pub fn get_all_departments(
    conn: &mut SqliteConnection,
) -> Result<Vec<Department>, diesel::result::Error> {
    departments::table
        .order(departments::name.asc())
        .load::<Department>(conn)
}

pub fn update_department(
    conn: &mut SqliteConnection,
    department_id: i32,
    input: DepartmentInput,
) -> Result<Department, DataError> {
    let name = normalized(&input.name)?;
    if get_department(conn, department_id)?.is_none() {
        return Err(DataError::NotFound("Department"));
    }
    if department_name_taken(conn, &name, Some(department_id))? {
        return Err(DataError::conflict(format!(
            "Department '{}' already exists",
            name
        )));
    }
    diesel::update(departments::table.filter(departments::id.eq(department_id)))
        .set((
            departments::name.eq(&name),
            departments::description.eq(&input.description),
        ))
        .execute(conn)?;
    get_department(conn, department_id)?.ok_or(DataError::NotFound("Department"))
}

/// Deletes a department. Refused while positions still belong to it;
/// employees in the department lose their `department_id`.
pub fn delete_department(conn: &mut SqliteConnection, department_id: i32) -> Result<(), DataError> {
    if get_department(conn, department_id)?.is_none() {
        return Err(DataError::NotFound("Department"));
    }
    let position_count: i64 = positions::table
        .filter(positions::department_id.eq(department_id))
        .count()
        .get_result(conn)?;
    if position_count > 0 {
        return Err(DataError::conflict(format!(
            "Department still has {} position(s); delete them first",
            position_count
        )));
    }
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(employees::table.filter(employees::department_id.eq(department_id)))
            .set(employees::department_id.eq(None::<i32>))
            .execute(conn)?;
        diesel::delete(departments::table.filter(departments::id.eq(department_id)))
            .execute(conn)?;
        Ok(())
    })?;
    Ok(())
}

pub fn add_position(
    conn: &mut SqliteConnection,
    input: PositionInput,
) -> Result<Position, DataError> {
    let name = normalized(&input.name)?;
    ensure_department_exists(conn, input.department_id)?;
    if position_name_taken(conn, &name, None)? {
        return Err(DataError::conflict(format!("Position '{}' already exists", name)));
    }
    diesel::insert_into(positions::table)
        .values(&PositionInput {
            name,
            department_id: input.department_id,
            description: input.description,
        })
        .execute(conn)?;
    let id = last_insert_id(conn)?;
    Ok(positions::table
        .filter(positions::id.eq(id))
        .first::<Position>(conn)?)
}

pub fn get_position(
    conn: &mut SqliteConnection,
    position_id: i32,
) -> Result<Option<Position>, diesel::result::Error> {
    positions::table
        .filter(positions::id.eq(position_id))
        .first::<Position>(conn)
        .optional()
}

/// All positions by name, each with its department's name.
pub fn get_all_positions(
    conn: &mut SqliteConnection,
) -> Result<Vec<PositionView>, diesel::result::Error> {
    let rows: Vec<(Position, Option<String>)> = positions::table
        .left_join(departments::table)
        .select((Position::as_select(), departments::name.nullable()))
        .order(positions::name.asc())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(position, department_name)| PositionView {
            position,
            department_name,
        })
        .collect())
}

pub fn update_position(
    conn: &mut SqliteConnection,
    position_id: i32,
    input: PositionInput,
) -> Result<Position, DataError> {
    let name = normalized(&input.name)?;
    if get_position(conn, position_id)?.is_none() {
        return Err(DataError::NotFound("Position"));
    }
    ensure_department_exists(conn, input.department_id)?;
    if position_name_taken(conn, &name, Some(position_id))? {
        return Err(DataError::conflict(format!("Position '{}' already exists", name)));
    }
    diesel::update(positions::table.filter(positions::id.eq(position_id)))
        .set((
            positions::name.eq(&name),
            positions::department_id.eq(input.department_id),
            positions::description.eq(&input.description),
        ))
        .execute(conn)?;
    get_position(conn, position_id)?.ok_or(DataError::NotFound("Position"))
}

/// Deletes a position and clears it from every employee holding it.
pub fn delete_position(conn: &mut SqliteConnection, position_id: i32) -> Result<(), DataError> {
    let removed = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(employees::table.filter(employees::position_id.eq(position_id)))
            .set(employees::position_id.eq(None::<i32>))
            .execute(conn)?;
        diesel::delete(positions::table.filter(positions::id.eq(position_id))).execute(conn)
    })?;
    if removed == 0 {
        return Err(DataError::NotFound("Position"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileUpdate;
    use crate::orm::employee::{get_employee, update_employee_profile};
    use crate::orm::testing::{insert_test_employee, setup_test_db};

    fn department(name: &str) -> DepartmentInput {
        DepartmentInput {
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_department_names_are_unique() {
        let mut conn = setup_test_db();
        add_department(&mut conn, department("Finance")).unwrap();
        assert!(matches!(
            add_department(&mut conn, department(" Finance ")),
            Err(DataError::Conflict(_))
        ));
        assert!(matches!(
            add_department(&mut conn, department("  ")),
            Err(DataError::Invalid(_))
        ));
    }

    #[test]
    fn test_department_with_positions_cannot_be_deleted() {
        let mut conn = setup_test_db();
        let finance = add_department(&mut conn, department("Finance")).unwrap();
        let clerk = add_position(
            &mut conn,
            PositionInput {
                name: "Clerk".to_string(),
                department_id: Some(finance.id),
                description: None,
            },
        )
        .unwrap();

        assert!(matches!(
            delete_department(&mut conn, finance.id),
            Err(DataError::Conflict(_))
        ));

        delete_position(&mut conn, clerk.id).unwrap();
        delete_department(&mut conn, finance.id).unwrap();
        assert!(get_all_departments(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_deleting_position_clears_employees() {
        let mut conn = setup_test_db();
        let finance = add_department(&mut conn, department("Finance")).unwrap();
        let clerk = add_position(
            &mut conn,
            PositionInput {
                name: "Clerk".to_string(),
                department_id: Some(finance.id),
                description: Some("Books".to_string()),
            },
        )
        .unwrap();
        let jane = insert_test_employee(&mut conn, "Jane Roe", "jane", "user");
        update_employee_profile(
            &mut conn,
            jane.id,
            &ProfileUpdate {
                position_id: Some(clerk.id),
                ..Default::default()
            },
        )
        .unwrap();

        let views = get_all_positions(&mut conn).unwrap();
        assert_eq!(views[0].department_name.as_deref(), Some("Finance"));

        delete_position(&mut conn, clerk.id).unwrap();
        assert!(get_employee(&mut conn, jane.id).unwrap().unwrap().position_id.is_none());
        assert!(matches!(
            delete_position(&mut conn, clerk.id),
            Err(DataError::NotFound(_))
        ));
    }
}

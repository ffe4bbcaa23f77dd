use super::DbPool;

pub const TABLA_USUARIOS: &str = r#"
CREATE TABLE IF NOT EXISTS usuarios (
    id UUID PRIMARY KEY,
    nombre TEXT NOT NULL,
    apellidos TEXT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    telefono TEXT,
    direccion TEXT,
    ciudad TEXT,
    codigo_postal TEXT,
    provincia TEXT,
    rol TEXT NOT NULL DEFAULT 'client',
    fecha_registro TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

pub const TABLA_PRESUPUESTOS: &str = r#"
CREATE TABLE IF NOT EXISTS presupuestos (
    id UUID PRIMARY KEY,
    usuario_id UUID REFERENCES usuarios(id) ON DELETE SET NULL,
    nombre TEXT NOT NULL,
    categoria TEXT NOT NULL,
    material TEXT NOT NULL,
    acabado TEXT NOT NULL,
    dimensiones JSONB NOT NULL,
    unidades INTEGER NOT NULL CHECK (unidades > 0),
    comentarios TEXT,
    imagenes JSONB NOT NULL DEFAULT '[]'::jsonb,
    presupuesto JSONB NOT NULL,
    estado TEXT NOT NULL DEFAULT 'pendiente',
    fecha_creacion TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    mensajes JSONB NOT NULL DEFAULT '[]'::jsonb,
    progreso JSONB NOT NULL DEFAULT '{"porcentaje": 0, "etapa_actual": "Revisión", "fecha_estimada": null}'::jsonb
);
CREATE INDEX IF NOT EXISTS presupuestos_usuario_idx ON presupuestos (usuario_id);
CREATE INDEX IF NOT EXISTS presupuestos_estado_idx ON presupuestos (estado);
"#;

pub const TABLA_PROYECTOS: &str = r#"
CREATE TABLE IF NOT EXISTS proyectos (
    id UUID PRIMARY KEY,
    usuario_id UUID REFERENCES usuarios(id) ON DELETE SET NULL,
    titulo TEXT NOT NULL,
    descripcion TEXT NOT NULL,
    tipo_proyecto TEXT NOT NULL,
    materiales_preferidos JSONB NOT NULL DEFAULT '[]'::jsonb,
    medidas TEXT,
    presupuesto_estimado DOUBLE PRECISION,
    fecha_solicitud TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    fecha_deseada DATE,
    fecha_entrega DATE,
    prioridad TEXT NOT NULL DEFAULT 'media',
    estado TEXT NOT NULL DEFAULT 'pendiente',
    comentarios JSONB NOT NULL DEFAULT '[]'::jsonb,
    artesanos JSONB NOT NULL DEFAULT '[]'::jsonb
);
CREATE INDEX IF NOT EXISTS proyectos_usuario_idx ON proyectos (usuario_id);
"#;

pub const NOMBRE_FUNCION_RPC: &str = "presupuestos_por_estado";

pub const FUNCION_PRESUPUESTOS_POR_ESTADO: &str = r#"
CREATE OR REPLACE FUNCTION presupuestos_por_estado()
RETURNS TABLE (estado TEXT, total BIGINT)
LANGUAGE sql STABLE
AS $$
    SELECT p.estado, COUNT(*)::BIGINT FROM presupuestos p GROUP BY p.estado
$$;
"#;

/// Aplica todo el esquema. Cada sentencia es idempotente.
pub async fn aplicar(pool: &DbPool) -> Result<(), sqlx::Error> {
    for ddl in [TABLA_USUARIOS, TABLA_PRESUPUESTOS, TABLA_PROYECTOS, FUNCION_PRESUPUESTOS_POR_ESTADO] {
        sqlx::raw_sql(ddl).execute(pool).await?;
    }
    Ok(())
}

pub async fn crear_tabla_presupuestos(pool: &DbPool) -> Result<(), sqlx::Error> {
    // presupuestos referencia a usuarios
    sqlx::raw_sql(TABLA_USUARIOS).execute(pool).await?;
    sqlx::raw_sql(TABLA_PRESUPUESTOS).execute(pool).await?;
    Ok(())
}

pub async fn crear_funcion_rpc(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(FUNCION_PRESUPUESTOS_POR_ESTADO).execute(pool).await?;
    Ok(())
}

pub async fn tabla_existe(pool: &DbPool, tabla: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT to_regclass($1::text) IS NOT NULL")
        .bind(format!("public.{tabla}"))
        .fetch_one(pool)
        .await
}

pub async fn funcion_existe(pool: &DbPool, nombre: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM pg_proc WHERE proname = $1)")
        .bind(nombre)
        .fetch_one(pool)
        .await
}

//! Static DDL for the six entity tables and their lookup indexes.
//!
//! Table statements carry `IF NOT EXISTS` even though the ensurer only runs
//! them after an existence check. Index statements are issued on every run
//! and rely on the same clause.

use super::{Entity, TableDescriptor};

pub(super) const USERS: TableDescriptor = TableDescriptor {
    entity: Entity::Users,
    create_sql: concat!(
        "CREATE TABLE IF NOT EXISTS public.users (",
        "  id BIGSERIAL PRIMARY KEY,",
        "  telegram_id BIGINT UNIQUE,",
        "  username VARCHAR(255),",
        "  full_name VARCHAR(255) NOT NULL,",
        "  role VARCHAR(20) NOT NULL",
        "    CONSTRAINT users_role_check CHECK (role IN ('admin', 'teacher', 'student')),",
        "  email VARCHAR(255) UNIQUE,",
        "  password_hash VARCHAR(255),",
        "  created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        ")"
    ),
    index_sql: &[
        "CREATE INDEX IF NOT EXISTS idx_users_telegram_id ON public.users (telegram_id)",
        "CREATE INDEX IF NOT EXISTS idx_users_role ON public.users (role)",
        "CREATE INDEX IF NOT EXISTS idx_users_email ON public.users (email)",
    ],
};

pub(super) const GROUPS: TableDescriptor = TableDescriptor {
    entity: Entity::Groups,
    create_sql: concat!(
        "CREATE TABLE IF NOT EXISTS public.groups (",
        "  id SERIAL PRIMARY KEY,",
        "  name VARCHAR(100) NOT NULL UNIQUE,",
        "  course INTEGER NOT NULL",
        "    CONSTRAINT groups_course_check CHECK (course BETWEEN 1 AND 6),",
        "  speciality VARCHAR(255),",
        "  curator_id BIGINT REFERENCES public.users(id) ON DELETE SET NULL,",
        "  created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        ")"
    ),
    index_sql: &[
        "CREATE INDEX IF NOT EXISTS idx_groups_curator_id ON public.groups (curator_id)",
        "CREATE INDEX IF NOT EXISTS idx_groups_course ON public.groups (course)",
    ],
};

pub(super) const SUBJECTS: TableDescriptor = TableDescriptor {
    entity: Entity::Subjects,
    create_sql: concat!(
        "CREATE TABLE IF NOT EXISTS public.subjects (",
        "  id SERIAL PRIMARY KEY,",
        "  name VARCHAR(255) NOT NULL,",
        "  type VARCHAR(20) NOT NULL",
        "    CONSTRAINT subjects_type_check CHECK (type IN ('lecture', 'practice', 'lab')),",
        "  hours INTEGER NOT NULL",
        "    CONSTRAINT subjects_hours_check CHECK (hours > 0),",
        "  description TEXT,",
        "  created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        ")"
    ),
    index_sql: &[
        "CREATE INDEX IF NOT EXISTS idx_subjects_name ON public.subjects (name)",
        "CREATE INDEX IF NOT EXISTS idx_subjects_type ON public.subjects (type)",
    ],
};

pub(super) const SCHEDULE: TableDescriptor = TableDescriptor {
    entity: Entity::Schedule,
    create_sql: concat!(
        "CREATE TABLE IF NOT EXISTS public.schedule (",
        "  id BIGSERIAL PRIMARY KEY,",
        "  subject_id INTEGER NOT NULL REFERENCES public.subjects(id) ON DELETE CASCADE,",
        "  group_id INTEGER NOT NULL REFERENCES public.groups(id) ON DELETE CASCADE,",
        "  teacher_id BIGINT NOT NULL REFERENCES public.users(id) ON DELETE CASCADE,",
        "  day_of_week SMALLINT NOT NULL",
        "    CONSTRAINT schedule_day_of_week_check CHECK (day_of_week BETWEEN 1 AND 7),",
        "  time_start TIME NOT NULL,",
        "  time_end TIME NOT NULL,",
        "  room VARCHAR(50),",
        "  week_type SMALLINT NOT NULL DEFAULT 0",
        "    CONSTRAINT schedule_week_type_check CHECK (week_type IN (0, 1, 2)),",
        "  lesson_type VARCHAR(20) NOT NULL",
        "    CONSTRAINT schedule_lesson_type_check",
        "    CHECK (lesson_type IN ('lecture', 'practice', 'lab')),",
        "  created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  CONSTRAINT schedule_time_range_check CHECK (time_end > time_start)",
        ")"
    ),
    index_sql: &[
        "CREATE INDEX IF NOT EXISTS idx_schedule_group_id ON public.schedule (group_id)",
        "CREATE INDEX IF NOT EXISTS idx_schedule_teacher_id ON public.schedule (teacher_id)",
        "CREATE INDEX IF NOT EXISTS idx_schedule_subject_id ON public.schedule (subject_id)",
        concat!(
            "CREATE INDEX IF NOT EXISTS idx_schedule_day_week ",
            "ON public.schedule (day_of_week, week_type)"
        ),
    ],
};

pub(super) const GROUP_STUDENTS: TableDescriptor = TableDescriptor {
    entity: Entity::GroupStudents,
    create_sql: concat!(
        "CREATE TABLE IF NOT EXISTS public.group_students (",
        "  id BIGSERIAL PRIMARY KEY,",
        "  group_id INTEGER NOT NULL REFERENCES public.groups(id) ON DELETE CASCADE,",
        "  student_id BIGINT NOT NULL REFERENCES public.users(id) ON DELETE CASCADE,",
        "  joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  CONSTRAINT group_students_group_student_key UNIQUE (group_id, student_id)",
        ")"
    ),
    index_sql: &[
        concat!(
            "CREATE INDEX IF NOT EXISTS idx_group_students_group_id ",
            "ON public.group_students (group_id)"
        ),
        concat!(
            "CREATE INDEX IF NOT EXISTS idx_group_students_student_id ",
            "ON public.group_students (student_id)"
        ),
    ],
};

pub(super) const ATTENDANCE: TableDescriptor = TableDescriptor {
    entity: Entity::Attendance,
    create_sql: concat!(
        "CREATE TABLE IF NOT EXISTS public.attendance (",
        "  id BIGSERIAL PRIMARY KEY,",
        "  lesson_id BIGINT NOT NULL REFERENCES public.schedule(id) ON DELETE CASCADE,",
        "  student_id BIGINT NOT NULL REFERENCES public.users(id) ON DELETE CASCADE,",
        "  date DATE NOT NULL,",
        "  status VARCHAR(20) NOT NULL",
        "    CONSTRAINT attendance_status_check",
        "    CHECK (status IN ('present', 'absent', 'late', 'excused')),",
        "  comment TEXT,",
        "  created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),",
        "  CONSTRAINT attendance_lesson_student_date_key UNIQUE (lesson_id, student_id, date)",
        ")"
    ),
    index_sql: &[
        "CREATE INDEX IF NOT EXISTS idx_attendance_lesson_id ON public.attendance (lesson_id)",
        "CREATE INDEX IF NOT EXISTS idx_attendance_student_id ON public.attendance (student_id)",
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON public.attendance (date)",
    ],
};
